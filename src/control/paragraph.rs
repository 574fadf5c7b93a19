// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

use super::pest::{Deb822Parser, Rule};
use pest::{error::Error as PestError, iterators::Pair, Parser};

/// [RawParagraph] contains all the raw, unprocessed and fully stringified
/// [RawField] values from the underlying document.
///
/// In general you will not use this directly; the [crate::control::ControlFile]
/// wrapper adds the case-insensitive field lookup the rest of the crate
/// works with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawParagraph {
    /// Raw series of fields, in the order they were seen in the Paragraph
    /// block.
    pub fields: Vec<RawField>,
}

/// Minimally processed Key-Value pair from the underlying RFC2822-like
/// file.
#[derive(Clone, Debug, PartialEq)]
pub struct RawField {
    /// Key name for the Field
    pub key: String,

    /// Value of the field
    pub value: String,
}

/// Error conditions which may be encountered when working with a
/// [RawParagraph].
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Error parsing the formatted paragraph; carries the underlying parser
    /// message and the input location of the problem.
    Parse((String, pest::error::InputLocation)),

    /// Something wasn't properly encoded within the Paragraph.
    Malformed,
}
crate::errors::error_enum!(Error);

impl From<PestError<Rule>> for Error {
    fn from(err: PestError<Rule>) -> Self {
        Error::Parse((err.variant.message().into(), err.location))
    }
}

impl TryFrom<Pair<'_, Rule>> for RawField {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut key: Option<String> = None;
        let mut value = String::new();

        for part in token.into_inner() {
            match part.as_rule() {
                Rule::field_name => {
                    key = Some(part.as_str().to_owned());
                }
                Rule::field_value => {
                    value.push_str(&format!("{}\n", part.as_str()));
                }
                _ => continue,
            };
        }

        let Some(key) = key else {
            return Err(Error::Malformed);
        };

        Ok(RawField {
            key,
            value: value.trim().to_owned(),
        })
    }
}

impl TryFrom<Pair<'_, Rule>> for RawParagraph {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut ret = Self { fields: vec![] };
        for token in token.into_inner() {
            match token.as_rule() {
                Rule::comment => {}
                Rule::field => {
                    ret.fields.push(token.try_into()?);
                }
                _ => {}
            }
        }
        Ok(ret)
    }
}

impl RawParagraph {
    /// Parse one block of RFC2822 style key/value pairs into a Paragraph.
    /// The input may not span multiple paragraphs.
    pub fn parse(paragraph: &str) -> Result<Self, Error> {
        let tokens = Deb822Parser::parse(Rule::single_paragraph, paragraph)?;
        let Some(token) = tokens.into_iter().next() else {
            unreachable!();
        };
        for token in token.into_inner() {
            #[allow(clippy::single_match)]
            match token.as_rule() {
                Rule::paragraph => return token.try_into(),
                _ => {}
            }
        }
        Ok(Default::default())
    }

    /// Iterate over all Key/Value pairs (as a [RawField]) in the
    /// [RawParagraph].
    pub fn iter(&self) -> impl Iterator<Item = &RawField> {
        self.fields.iter()
    }

    /// Return all matching [RawField] by the field's key, bytewise.
    pub fn field<'field>(
        &'field self,
        field_name: &'field str,
    ) -> impl Iterator<Item = &'field RawField> {
        self.fields.iter().filter(move |f| f.key == field_name)
    }
}

#[cfg(test)]
mod tests {
    use crate::control::RawParagraph;

    macro_rules! check_paragraph_parse {
        ($name:ident, $paragraph:expr, |$para:ident| $block:tt ) => {
            #[test]
            fn $name() {
                let $para = RawParagraph::parse($paragraph).unwrap();
                $block;
            }
        };
    }

    macro_rules! check_paragraph_parse_fails {
        ($name:ident, $paragraph:expr) => {
            #[test]
            fn $name() {
                assert!(RawParagraph::parse($paragraph).is_err());
            }
        };
    }

    check_paragraph_parse!(
        check_parse_simple,
        "\
Package: foo
Version: 1.0
",
        |p| {
            assert_eq!("foo", p.field("Package").next().unwrap().value);
            assert_eq!("1.0", p.field("Version").next().unwrap().value);
        }
    );

    check_paragraph_parse!(
        check_parse_comment,
        "\
Key: Value
# Comment
Key1: Value1
",
        |p| {
            assert_eq!("Value", p.field("Key").next().unwrap().value);
            assert_eq!("Value1", p.field("Key1").next().unwrap().value);
            assert_eq!(2, p.iter().count());
        }
    );

    check_paragraph_parse!(
        check_parse_continuation,
        "\
Description: short
 longer text
 and more
",
        |p| {
            assert_eq!(
                "short\nlonger text\nand more",
                p.field("Description").next().unwrap().value
            );
        }
    );

    check_paragraph_parse!(
        check_parse_no_space,
        "Package:foo",
        |p| {
            assert_eq!("foo", p.field("Package").next().unwrap().value);
        }
    );

    check_paragraph_parse!(
        check_parse_empty_value,
        "Conffiles:\n /etc/foo.conf",
        |p| {
            assert_eq!("/etc/foo.conf", p.field("Conffiles").next().unwrap().value);
        }
    );

    check_paragraph_parse_fails!(check_two_paragraphs, "Key: Value\n\nKey2: Value2\n");
    check_paragraph_parse_fails!(check_no_colon, "garbage\n");
    check_paragraph_parse_fails!(check_empty, "");
}

// vim: foldmethod=marker

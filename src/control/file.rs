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

use super::paragraph::{Error, RawField, RawParagraph};
use std::str::FromStr;

/// An ordered field/value map with case-insensitive keys, as read from and
/// written to `control`, `wpkg-status` and repository index entries.
///
/// Field order is preserved, and [ControlFile::set_field] keeps the
/// position of a field being replaced, so rewriting a file does not
/// scramble it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlFile {
    fields: Vec<RawField>,
}

impl ControlFile {
    /// Create an empty [ControlFile].
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse one paragraph of field/value pairs.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(ControlFile {
            fields: RawParagraph::parse(text)?.fields,
        })
    }

    /// Look up the value of a field. Keys compare case-insensitively; when
    /// a field was repeated, the first occurrence wins.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    /// Whether a field is present at all.
    pub fn field_is_defined(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Read a field as a boolean: `yes`, `true` and `1` (case-insensitive)
    /// are true, everything else -- including an absent field -- is false.
    pub fn boolean_field(&self, name: &str) -> bool {
        match self.field(name) {
            Some(value) => {
                value.eq_ignore_ascii_case("yes")
                    || value.eq_ignore_ascii_case("true")
                    || value == "1"
            }
            None => false,
        }
    }

    /// Set a field, replacing an existing one in place.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|f| f.key.eq_ignore_ascii_case(name))
        {
            Some(field) => field.value = value,
            None => self.fields.push(RawField {
                key: name.to_owned(),
                value,
            }),
        }
    }

    /// Remove a field. Returns whether the field was present.
    pub fn remove_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| !f.key.eq_ignore_ascii_case(name));
        before != self.fields.len()
    }

    /// Iterate over the fields in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|f| (f.key.as_str(), f.value.as_str()))
    }
}

impl FromStr for ControlFile {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        Self::parse(text)
    }
}

impl std::fmt::Display for ControlFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for field in &self.fields {
            let mut lines = field.value.lines();
            writeln!(f, "{}: {}", field.key, lines.next().unwrap_or(""))?;
            for line in lines {
                // a continuation line may not be empty, the convention is
                // a lone period
                if line.is_empty() {
                    writeln!(f, " .")?;
                } else {
                    writeln!(f, " {}", line)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let ctrl = ControlFile::parse("Package: foo\nInstalled-Size: 12\n").unwrap();
        assert_eq!(Some("foo"), ctrl.field("package"));
        assert_eq!(Some("12"), ctrl.field("INSTALLED-SIZE"));
        assert!(ctrl.field_is_defined("Package"));
        assert!(!ctrl.field_is_defined("Version"));
    }

    #[test]
    fn booleans() {
        let ctrl = ControlFile::parse("A: yes\nB: True\nC: 1\nD: no\nE: whatever\n").unwrap();
        assert!(ctrl.boolean_field("A"));
        assert!(ctrl.boolean_field("B"));
        assert!(ctrl.boolean_field("C"));
        assert!(!ctrl.boolean_field("D"));
        assert!(!ctrl.boolean_field("E"));
        assert!(!ctrl.boolean_field("F"));
    }

    #[test]
    fn set_field_replaces_in_place() {
        let mut ctrl = ControlFile::parse("Package: foo\nVersion: 1.0\n").unwrap();
        ctrl.set_field("version", "2.0");
        ctrl.set_field("X-Status", "Installed");
        assert_eq!(
            "Package: foo\nVersion: 2.0\nX-Status: Installed\n",
            ctrl.to_string()
        );
        assert!(ctrl.remove_field("x-status"));
        assert!(!ctrl.remove_field("x-status"));
    }

    #[test]
    fn round_trip_multiline() {
        let text = "Package: foo\nDescription: short\n longer line\n";
        let ctrl = ControlFile::parse(text).unwrap();
        assert_eq!(Some("short\nlonger line"), ctrl.field("Description"));
        assert_eq!(text, ctrl.to_string());
    }
}

// vim: foldmethod=marker

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

//! Field validation expressions.
//!
//! An administrator can require arbitrary field predicates of the packages
//! being installed, written as a tiny expression language:
//!
//! ```text
//! Priority = "required"
//! Version >= "2.0" and Essential
//! Maintainer != "nobody" or Priority = "extra"
//! ```
//!
//! A term is either a bare field name (true when the field is defined and
//! holds a truthy value) or `field op value` with the operators `=` `!=`
//! `<<` `<=` `>=` `>>`. When both sides of a comparison parse as a
//! [crate::version::Version] they compare as versions, otherwise bytewise.
//! Terms chain left-associatively with `and` and `or`.

use crate::version::Version;
use std::cmp::Ordering;

/// Error conditions which may be encountered when evaluating a field
/// validation expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The expression is empty.
    Empty,

    /// An unexpected character or token was found. Carries the offending
    /// text.
    UnexpectedToken(String),

    /// A double-quoted string is missing its closing quote.
    UnterminatedString,

    /// An operator is missing its right-hand value.
    MissingValue,
}
crate::errors::error_enum!(Error);

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Operator(Operator),
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Ge,
    Gt,
}

impl Operator {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
            Operator::Gt => ordering == Ordering::Greater,
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = vec![];
    let mut chars = expression.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if ch == '"' {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => value.push(ch),
                    None => return Err(Error::UnterminatedString),
                }
            }
            tokens.push(Token::Quoted(value));
            continue;
        }
        if matches!(ch, '=' | '!' | '<' | '>') {
            let mut op = String::new();
            while let Some(&ch) = chars.peek() {
                if matches!(ch, '=' | '!' | '<' | '>') {
                    op.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            let op = match op.as_str() {
                "=" => Operator::Eq,
                "!=" => Operator::Ne,
                "<<" => Operator::Lt,
                "<=" => Operator::Le,
                ">=" => Operator::Ge,
                ">>" => Operator::Gt,
                _ => return Err(Error::UnexpectedToken(op)),
            };
            tokens.push(Token::Operator(op));
            continue;
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '+' | '~' | ':') {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '+' | '~' | ':') {
                    word.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Word(word));
            continue;
        }
        return Err(Error::UnexpectedToken(ch.to_string()));
    }
    Ok(tokens)
}

fn compare(left: &str, right: &str) -> Ordering {
    match (left.parse::<Version>(), right.parse::<Version>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => left.cmp(right),
    }
}

fn truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true") || value == "1"
}

/// Evaluate a field validation expression against a field lookup.
pub fn evaluate<F>(expression: &str, lookup: F) -> Result<bool, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let tokens = tokenize(expression)?;
    let mut tokens = tokens.into_iter().peekable();

    let term = |tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>| {
        let field = match tokens.next() {
            Some(Token::Word(word)) => word,
            Some(Token::Quoted(text)) => return Err(Error::UnexpectedToken(text)),
            Some(Token::Operator(_)) => return Err(Error::UnexpectedToken("operator".to_owned())),
            None => return Err(Error::Empty),
        };
        match tokens.peek() {
            Some(Token::Operator(_)) => {
                let Some(Token::Operator(op)) = tokens.next() else {
                    unreachable!();
                };
                let value = match tokens.next() {
                    Some(Token::Quoted(value)) | Some(Token::Word(value)) => value,
                    _ => return Err(Error::MissingValue),
                };
                Ok(match lookup(&field) {
                    Some(actual) => op.holds(compare(&actual, &value)),
                    None => false,
                })
            }
            _ => Ok(match lookup(&field) {
                Some(actual) => truthy(&actual),
                None => false,
            }),
        }
    };

    let mut ret = term(&mut tokens)?;
    loop {
        match tokens.next() {
            None => return Ok(ret),
            Some(Token::Word(word)) if word == "and" => {
                let rhs = term(&mut tokens)?;
                ret = ret && rhs;
            }
            Some(Token::Word(word)) if word == "or" => {
                let rhs = term(&mut tokens)?;
                ret = ret || rhs;
            }
            Some(Token::Word(word)) => return Err(Error::UnexpectedToken(word)),
            Some(Token::Quoted(text)) => return Err(Error::UnexpectedToken(text)),
            Some(Token::Operator(_)) => {
                return Err(Error::UnexpectedToken("operator".to_owned()))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "Package" => Some("foo".to_owned()),
            "Version" => Some("1.10".to_owned()),
            "Essential" => Some("yes".to_owned()),
            "Priority" => Some("optional".to_owned()),
            _ => None,
        }
    }

    macro_rules! check_eval {
        ($name:ident, $expr:expr, $check:expr) => {
            #[test]
            fn $name() {
                assert_eq!(Ok($check), evaluate($expr, lookup));
            }
        };
    }

    check_eval!(eval_eq, "Package = \"foo\"", true);
    check_eval!(eval_eq_false, "Package = \"bar\"", false);
    check_eval!(eval_ne, "Priority != \"required\"", true);
    check_eval!(eval_bare_truthy, "Essential", true);
    check_eval!(eval_bare_not_truthy, "Priority", false);
    check_eval!(eval_bare_missing, "Whatever", false);
    check_eval!(eval_missing_field_compare, "Whatever = \"x\"", false);
    check_eval!(eval_version_semantics, "Version >= \"1.9\"", true);
    check_eval!(eval_version_semantics_lt, "Version << \"1.9\"", false);
    check_eval!(eval_and, "Package = \"foo\" and Essential", true);
    check_eval!(eval_and_false, "Package = \"bar\" and Essential", false);
    check_eval!(eval_or, "Package = \"bar\" or Essential", true);
    check_eval!(eval_unquoted_value, "Version = 1.10", true);

    #[test]
    fn eval_errors() {
        assert_eq!(Err(Error::Empty), evaluate("", lookup));
        assert_eq!(
            Err(Error::UnterminatedString),
            evaluate("Package = \"foo", lookup)
        );
        assert_eq!(Err(Error::MissingValue), evaluate("Package =", lookup));
        assert!(evaluate("Package ~ foo", lookup).is_err());
    }
}

// vim: foldmethod=marker

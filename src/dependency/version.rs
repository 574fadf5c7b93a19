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

use super::{pest::Rule, Error};
use crate::version::Version;
use pest::iterators::Pair;
use std::cmp::Ordering;

/// Version constraint operator, used to limit the way a [Version] number is
/// compared to a package's [Version].
///
/// The dialect does not have a "not equal" operator, and it does not accept
/// a lone `<` or `>`; asking for either is a parse error rather than a
/// silent reinterpretation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VersionOperator {
    /// Equal operator (`=`), an exact match in version number.
    Equal,

    /// GreaterThan operator (`>>`), strictly greater than the indicated
    /// Version.
    GreaterThan,

    /// LessThan operator (`<<`), strictly smaller than the indicated
    /// Version.
    LessThan,

    /// GreaterThanOrEqual operator (`>=`). This is the default when a
    /// version is given without an operator, and it is omitted again when
    /// the constraint is written back out.
    GreaterThanOrEqual,

    /// LessThanOrEqual operator (`<=`).
    LessThanOrEqual,
}

impl VersionOperator {
    /// Return the [VersionOperator] as a borrowed string ref.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equal => "=",
            Self::GreaterThan => ">>",
            Self::LessThan => "<<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
        }
    }

    /// Check a candidate [Version] against the constrained version under
    /// this operator.
    pub fn matches(&self, candidate: &Version, constraint: &Version) -> bool {
        let ordering = candidate.cmp(constraint);
        match self {
            Self::Equal => ordering == Ordering::Equal,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::LessThan => ordering == Ordering::Less,
            Self::GreaterThanOrEqual => ordering != Ordering::Less,
            Self::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl std::fmt::Display for VersionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A [VersionConstraint] limits a [crate::dependency::Possibility] to only
/// be satisfied by a subset of all [Version] values. The [VersionOperator]
/// defines how the [Version]s are compared.
///
/// In general, you're unlikely to be parsing these directly, instead
/// you're likely going to see a [VersionConstraint] by parsing a
/// [crate::dependency::Dependency].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionConstraint {
    /// Comparison to use when evaluating if a candidate satisfies this
    /// constraint.
    pub operator: VersionOperator,

    /// Specific [Version] to compare a package against.
    pub version: Version,
}

impl VersionConstraint {
    /// Whether the candidate [Version] satisfies this constraint.
    pub fn matches(&self, candidate: &Version) -> bool {
        self.operator.matches(candidate, &self.version)
    }
}

impl std::fmt::Display for VersionConstraint {
    /// The default `>=` operator is omitted, so `foo (>= 1.0)` canonicalizes
    /// to `foo (1.0)`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.operator {
            VersionOperator::GreaterThanOrEqual => write!(f, "{}", self.version),
            operator => write!(f, "{} {}", operator, self.version),
        }
    }
}

impl TryFrom<Pair<'_, Rule>> for VersionConstraint {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        // version without an operator defaults to >=
        let mut operator = VersionOperator::GreaterThanOrEqual;
        let mut version: Option<Version> = None;

        for token in token.into_inner() {
            match token.as_rule() {
                Rule::version_operator => {
                    operator = match token.as_str() {
                        "=" => VersionOperator::Equal,
                        "<<" => VersionOperator::LessThan,
                        "<=" => VersionOperator::LessThanOrEqual,
                        ">=" => VersionOperator::GreaterThanOrEqual,
                        ">>" => VersionOperator::GreaterThan,
                        "!=" | "<>" => {
                            return Err(Error::NotEqualOperator);
                        }
                        "<" | ">" => {
                            return Err(Error::LoneRelationalOperator);
                        }
                        _ => {
                            unreachable!();
                        }
                    };
                }
                Rule::version => {
                    version = Some(token.as_str().parse()?);
                }
                _ => continue,
            };
        }

        let Some(version) = version else {
            return Err(Error::InvalidVersionConstraint);
        };

        Ok(VersionConstraint { operator, version })
    }
}

// vim: foldmethod=marker

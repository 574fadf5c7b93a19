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

use super::{
    pest::{DependencyParser, Rule},
    Relation,
};
use crate::{architecture, version};
use pest::{error::Error as PestError, iterators::Pair, Parser};
use std::str::FromStr;

/// A [Dependency] is a set of constraints which must be met in order to
/// be satisfied. These are the values of the `Depends`, `Pre-Depends`,
/// `Conflicts`, `Breaks`, `Build-Depends` (and friends) control fields.
///
/// Each [Dependency] is comprised of a set of [Relation]s, which must all
/// be satisfied in order for the [Dependency] to be satisfied. Each
/// [Relation] is effectively an `AND` operation.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Dependency {
    /// Set of [Relation] values which must *all* be satisfied in order for
    /// the Dependency to be satisfied.
    pub relations: Vec<Relation>,
}

/// Error conditions which may be encountered when parsing a String into a
/// [Dependency].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Error parsing the Dependency line; carries the underlying parser
    /// message and the input location of the problem.
    Parse((String, pest::error::InputLocation)),

    /// A package name does not follow the package naming rule. Carries the
    /// offending name.
    InvalidPackageName(String),

    /// A 'not equal' operator (`!=` or `<>`) is not acceptable as a
    /// dependency relationship.
    NotEqualOperator,

    /// A lone `<` or `>` is not acceptable as a dependency relationship;
    /// use `<=` or `>=` instead.
    LoneRelationalOperator,

    /// A [crate::dependency::VersionConstraint] is malformed in some way.
    InvalidVersionConstraint,

    /// A [crate::version::Version] inside a constraint could not be parsed.
    InvalidVersion(version::Error),

    /// An architecture mask could not be parsed.
    InvalidArch(architecture::Error),

    /// An architecture mask list is malformed in some way.
    InvalidArchConstraint,

    /// An architecture mask list mixes negated and non-negated entries;
    /// either all or none of the masks take the `!` operator.
    MixedArchPolarity,

    /// Only one [crate::dependency::VersionConstraint] may be specified for
    /// a given [crate::dependency::Possibility].
    TooManyVersions,

    /// Only one architecture mask list may be specified for a given
    /// [crate::dependency::Possibility].
    TooManyArches,
}
crate::errors::error_enum!(Error);

impl From<architecture::Error> for Error {
    fn from(err: architecture::Error) -> Self {
        Error::InvalidArch(err)
    }
}

impl From<version::Error> for Error {
    fn from(err: version::Error) -> Self {
        Error::InvalidVersion(err)
    }
}

impl From<PestError<Rule>> for Error {
    fn from(err: PestError<Rule>) -> Self {
        Error::Parse((err.variant.message().into(), err.location))
    }
}

impl Dependency {
    /// Render without the architecture masks, which is the form written to
    /// a binary package's control file.
    pub fn to_string_without_arch(&self) -> String {
        self.relations
            .iter()
            .map(|v| v.to_string_without_arch())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            self.relations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl TryFrom<Pair<'_, Rule>> for Dependency {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut ret = Dependency { relations: vec![] };
        for relation in token.into_inner() {
            match relation.as_rule() {
                Rule::relation => {}
                _ => continue,
            };
            ret.relations.push(relation.try_into()?);
        }

        Ok(ret)
    }
}

impl FromStr for Dependency {
    type Err = Error;

    fn from_str(v: &str) -> Result<Self, Error> {
        let Some(token) = DependencyParser::parse(Rule::dependency, v)?.next() else {
            // No dependencies, empty.
            return Ok(Dependency { relations: vec![] });
        };

        token.try_into()
    }
}

#[cfg(feature = "serde")]
mod serde {
    use super::Dependency;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Dependency {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            String::serialize(&self.to_string(), serializer)
        }
    }

    impl<'de> Deserialize<'de> for Dependency {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            s.parse().map_err(|e| D::Error::custom(format!("{:?}", e)))
        }
    }
}

// vim: foldmethod=marker

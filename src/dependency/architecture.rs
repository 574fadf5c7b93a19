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
use crate::architecture::Architecture;
use pest::iterators::Pair;

/// An architecture mask list attached to a [crate::dependency::Possibility],
/// written as `[amd64 arm64]` or `[!amd64 !arm64]`.
///
/// The masks are either all positive (the possibility only applies on an
/// architecture matching one of them) or all negated (the possibility
/// applies everywhere except on an architecture matching one of them).
/// Mixing the two in one list is rejected when parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchConstraints {
    /// True if the list is negated: the masks name the architectures the
    /// possibility does *not* apply to.
    pub negated: bool,

    /// Architecture patterns being matched against the target architecture.
    pub arches: Vec<Architecture>,
}

impl ArchConstraints {
    /// Whether a possibility carrying this mask list applies to the given
    /// target architecture.
    pub fn applies_to(&self, target: &Architecture, ignore_vendor: bool) -> bool {
        let hit = self
            .arches
            .iter()
            .any(|pattern| target.matches(pattern, ignore_vendor));
        if self.negated {
            !hit
        } else {
            hit
        }
    }
}

impl std::fmt::Display for ArchConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let not = if self.negated { "!" } else { "" };
        write!(
            f,
            "{}",
            self.arches
                .iter()
                .map(|v| format!("{}{}", not, v))
                .collect::<Vec<_>>()
                .join(" ")
        )
    }
}

impl TryFrom<Pair<'_, Rule>> for ArchConstraints {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut negated: Option<bool> = None;
        let mut arches: Vec<Architecture> = vec![];

        for constraint in token.into_inner() {
            match constraint.as_rule() {
                Rule::arch_constraint => {}
                _ => continue,
            };

            let mut not = false;
            let mut arch: Option<Architecture> = None;
            for token in constraint.into_inner() {
                match token.as_rule() {
                    Rule::not => not = true,
                    Rule::arch_name => arch = Some(token.as_str().parse()?),
                    _ => continue,
                };
            }
            let Some(arch) = arch else {
                return Err(Error::InvalidArchConstraint);
            };

            // either all of the masks are negated or none of them are
            match negated {
                None => negated = Some(not),
                Some(negated) if negated != not => {
                    return Err(Error::MixedArchPolarity);
                }
                Some(_) => {}
            }
            arches.push(arch);
        }

        let Some(negated) = negated else {
            return Err(Error::InvalidArchConstraint);
        };

        Ok(ArchConstraints { negated, arches })
    }
}

// vim: foldmethod=marker

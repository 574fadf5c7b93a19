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

use super::{pest::Rule, ArchConstraints, Error, VersionConstraint};
use crate::architecture::Architecture;
use crate::version::Version;
use pest::iterators::Pair;

// Device names some file systems reserve; a package directory of that
// name could never be created in the database.
const RESERVED_NAMES: &[&str] = &[
    "aux", "con", "nul", "prn", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// The device names are reserved under any extension (`con.txt` is just
/// as unusable as `con`), so the check runs against the name with
/// everything after the last period removed.
fn is_reserved_filename(name: &str) -> bool {
    let stem = match name.rfind('.') {
        Some(p) if p != 0 => &name[..p],
        _ => name,
    };
    RESERVED_NAMES.contains(&stem)
}

/// Check a package name against the naming rule.
///
/// Names are at least two characters of lowercase letters, digits and the
/// specials `+` `-` `.`; a special may not start or end the name, nor be
/// followed by a period (which also rules out `..`). Names that collide
/// with a reserved file system device name -- with or without an
/// extension -- are refused since every known package owns a directory
/// of its own name in the database, and so is the name `tmp`, which the
/// database uses for its scratch space. The special name `core` is a
/// valid package name; the database itself uses it.
pub fn is_package_name(name: &str) -> bool {
    if name.len() < 2 {
        return false;
    }
    let bytes = name.as_bytes();
    for (idx, &ch) in bytes.iter().enumerate() {
        match ch {
            b'-' | b'.' | b'+' => {
                if idx == 0 || idx + 1 == bytes.len() || bytes[idx + 1] == b'.' {
                    return false;
                }
            }
            b'a'..=b'z' | b'0'..=b'9' => {}
            _ => return false,
        }
    }
    name != "tmp" && !is_reserved_filename(name)
}

/// A [Possibility] is the lowest level of [crate::dependency::Dependency]
/// relationships -- a specific package which may be used to satisfy a
/// requirement.
///
/// There are a number of constraints which limit how this [Possibility]
/// may be considered. Those are parsed and exported as members of the
/// [Possibility]. In order for a [Possibility] to be met, all the
/// constraints which limit the consideration of the package must be met.
///
/// In general, you're unlikely to be parsing these directly, instead
/// you're likely going to see a [Possibility] by parsing a
/// [crate::dependency::Dependency].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Possibility {
    /// Name of the package which may satisfy this particular Dependency
    /// relationship.
    pub name: String,

    /// This constraint limits the [crate::version::Version] of the package
    /// which satisfies this [Possibility].
    pub version_constraint: Option<VersionConstraint>,

    /// This constraint limits the target [Architecture]s on which this
    /// [Possibility] is considered at all. On other targets the
    /// [Possibility] is treated as if it had not been written.
    pub arch_constraints: Option<ArchConstraints>,
}

impl Possibility {
    /// Whether a candidate version satisfies the version constraint (a
    /// missing constraint is satisfied by anything).
    pub fn version_matches(&self, candidate: &Version) -> bool {
        match &self.version_constraint {
            Some(constraint) => constraint.matches(candidate),
            None => true,
        }
    }

    /// Whether this possibility applies on the given target architecture,
    /// per its architecture masks. A possibility without masks applies
    /// everywhere.
    pub fn applies_to(&self, target: &Architecture, ignore_vendor: bool) -> bool {
        match &self.arch_constraints {
            Some(constraints) => constraints.applies_to(target, ignore_vendor),
            None => true,
        }
    }

    /// Render without the architecture masks, which is the form written to
    /// a binary package's control file.
    pub fn to_string_without_arch(&self) -> String {
        let mut ret = self.name.clone();
        if let Some(version_constraint) = &self.version_constraint {
            ret.push_str(&format!(" ({})", version_constraint));
        }
        ret
    }
}

impl std::fmt::Display for Possibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_without_arch())?;
        if let Some(arch_constraints) = &self.arch_constraints {
            write!(f, " [{}]", arch_constraints)?;
        }
        Ok(())
    }
}

impl TryFrom<Pair<'_, Rule>> for Possibility {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut ret = Possibility {
            ..Default::default()
        };

        for constraint in token.into_inner() {
            match constraint.as_rule() {
                Rule::package_name => {
                    let name = constraint.as_str();
                    if !is_package_name(name) {
                        return Err(Error::InvalidPackageName(name.to_owned()));
                    }
                    ret.name = name.to_owned();
                }
                Rule::version_constraint => {
                    if ret.version_constraint.is_some() {
                        return Err(Error::TooManyVersions);
                    }
                    ret.version_constraint = Some(constraint.try_into()?);
                }
                Rule::arch_constraints => {
                    if ret.arch_constraints.is_some() {
                        return Err(Error::TooManyArches);
                    }
                    ret.arch_constraints = Some(constraint.try_into()?);
                }
                _ => continue,
            };
        }

        Ok(ret)
    }
}

// vim: foldmethod=marker

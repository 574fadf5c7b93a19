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

//! Package version type: parsing, validation and canonical output.

use super::compare::{parts, Part};
use std::str::FromStr;

/// Package version number.
///
/// A [Version] takes the form of `[epoch:]upstream[-revision]`.
///
/// Versions are folded at parse time: ASCII letters are lowercased, and a
/// semi-colon is accepted as an exact equivalent of a colon (colons cannot
/// appear in filenames on some of the file systems the package files travel
/// through). The canonical spelling uses the colon; see
/// [Version::to_filename_string] for the reverse mapping.
#[derive(Clone, Debug, Default)]
pub struct Version {
    /// A single (generally small) unsigned decimal number. It defaults to
    /// zero, and zero epochs are omitted from the canonical output unless
    /// the upstream part itself contains a colon.
    epoch: u32,

    /// The main part of the version number. It must start with a digit, and
    /// may contain lowercase letters, digits, and the characters `.` `+`
    /// `-` `~` `:`.
    upstream: String,

    /// The package revision based on the upstream version. Compared in the
    /// same way as the upstream part, and compared as `0` when absent.
    revision: Option<String>,
}

/// Error conditions which may be encountered when parsing a String
/// into a [Version].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The string provided to [Version] is empty.
    Empty,

    /// The [Version] starts with a colon, so the epoch is the empty string.
    EmptyEpoch,

    /// The epoch contains something other than decimal digits.
    NonDecimalEpoch,

    /// The epoch is a decimal number too large to store.
    EpochOverflow,

    /// The [Version] ends with a dash, so the revision is the empty string.
    EmptyRevision,

    /// The upstream part of the [Version] does not start with a digit.
    MissingLeadingDigit,

    /// The upstream or revision part contains a character outside the
    /// permitted set.
    InvalidCharacter,
}
crate::errors::error_enum!(Error);

/// Fold one character: letters are lowercased, and `;` is mapped to `:`.
fn fold(ch: char) -> char {
    match ch {
        'A'..='Z' => ch.to_ascii_lowercase(),
        ';' => ':',
        ch => ch,
    }
}

fn valid_part(part: &str, colon: bool) -> bool {
    part.chars().all(|ch| {
        ch.is_ascii_lowercase()
            || ch.is_ascii_digit()
            || ch == '.'
            || ch == '+'
            || ch == '-'
            || ch == '~'
            || (ch == ':' && colon)
    })
}

impl Version {
    /// Return the epoch of the [Version]. Zero when not spelled out.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Return the upstream part of the [Version]. This must be compared
    /// according to the package version comparison rules, not bytewise.
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Return the revision of the [Version], if one was given. An absent
    /// revision compares as `0`.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Render the canonical form with every colon spelled as a semi-colon,
    /// which is the form used inside archive and index member names.
    pub fn to_filename_string(&self) -> String {
        self.to_string().replace(':', ";")
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(ver: &str) -> Result<Self, Error> {
        let ver = ver.trim();
        if ver.is_empty() {
            return Err(Error::Empty);
        }
        let ver = ver.chars().map(fold).collect::<String>();

        let mut ret = Version::default();
        let rest = match ver.split_once(':') {
            Some((epoch, rest)) => {
                if epoch.is_empty() {
                    return Err(Error::EmptyEpoch);
                }
                if !epoch.chars().all(|ch| ch.is_ascii_digit()) {
                    return Err(Error::NonDecimalEpoch);
                }
                ret.epoch = epoch.parse().map_err(|_| Error::EpochOverflow)?;
                rest
            }
            None => &ver,
        };

        match rest.rsplit_once('-') {
            Some((upstream, revision)) => {
                if revision.is_empty() {
                    return Err(Error::EmptyRevision);
                }
                ret.upstream = upstream.to_owned();
                ret.revision = Some(revision.to_owned());
            }
            None => {
                ret.upstream = rest.to_owned();
            }
        }

        match ret.upstream.chars().next() {
            Some(ch) if ch.is_ascii_digit() => {}
            _ => return Err(Error::MissingLeadingDigit),
        }
        if !valid_part(&ret.upstream, true) {
            return Err(Error::InvalidCharacter);
        }
        if let Some(revision) = &ret.revision {
            if !valid_part(revision, false) {
                return Err(Error::InvalidCharacter);
            }
        }

        Ok(ret)
    }
}

impl std::fmt::Display for Version {
    /// The output is canonical: a zero epoch is omitted (unless the upstream
    /// still contains a colon), a revision of plain `0` is omitted, and
    /// trailing zero parts (`1.0.0` → `1.0`) are stripped.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let upstream = parts_to_string(&parts(&self.upstream));
        if self.epoch > 0 || upstream.contains(':') {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", upstream)?;
        if let Some(revision) = &self.revision {
            let revision_parts = parts(revision);
            if !revision_parts.iter().all(Part::is_zero) {
                write!(f, "-{}", parts_to_string(&revision_parts))?;
            }
        }
        Ok(())
    }
}

/// Concatenate the parts back, stripping redundant trailing zero groups
/// (`1.0.0` → `1.0`). A zero group is only dropped together with its own
/// zero separator, and never from behind a separator that stays, so the
/// output cannot end in a dangling `:`; a version that is zero all the
/// way through collapses to plain `0`.
fn parts_to_string(parts: &[Part]) -> String {
    if parts.iter().all(Part::is_zero) {
        return "0".to_owned();
    }
    let mut count = parts.len();
    // a trailing lone separator carries no digits at all
    if count % 2 == 1 && parts[count - 1].is_zero() {
        count -= 1;
    }
    while count > 4 && parts[count - 1].is_zero() && parts[count - 2].is_zero() {
        count -= 2;
    }
    let mut ret = String::new();
    for part in &parts[..count] {
        match part {
            Part::Text(text) => ret.push_str(text),
            Part::Digits(digits) => {
                let digits = digits.trim_start_matches('0');
                ret.push_str(if digits.is_empty() { "0" } else { digits });
            }
        }
    }
    ret
}

#[cfg(feature = "serde")]
mod serde {
    use super::Version;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Version {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            String::serialize(&self.to_string(), serializer)
        }
    }

    impl<'de> Deserialize<'de> for Version {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            s.parse().map_err(|e| D::Error::custom(format!("{:?}", e)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_matches {
        ($name:ident, $version:expr, ($epoch:expr, $upstream:expr, $revision:expr)) => {
            #[test]
            fn $name() {
                let v: Version = $version.parse().unwrap();
                assert_eq!($epoch, v.epoch());
                assert_eq!($upstream, v.upstream());
                assert_eq!($revision, v.revision());
            }
        };
    }

    macro_rules! check_parse_fails {
        ($name:ident, $version:expr, $error:expr) => {
            #[test]
            fn $name() {
                assert_eq!(Err($error), $version.parse::<Version>());
            }
        };
    }

    macro_rules! check_canonical {
        ($name:ident, $version:expr, $canonical:expr) => {
            #[test]
            fn $name() {
                let v: Version = $version.parse().unwrap();
                assert_eq!($canonical, v.to_string());
            }
        };
    }

    check_matches!(simple_version, "1.0-1", (0, "1.0", Some("1")));
    check_matches!(simple_version_epoch, "1:1.0-1", (1, "1.0", Some("1")));
    check_matches!(spaces, "   1.0-1  ", (0, "1.0", Some("1")));
    check_matches!(folded_case, "1.0RC1", (0, "1.0rc1", None));
    check_matches!(folded_semicolon, "1;1.0", (1, "1.0", None));
    check_matches!(upstream_colons, "0:0:0:0-0", (0, "0:0:0", Some("0")));
    check_matches!(last_dash_splits, "1.0-rc1-2", (0, "1.0-rc1", Some("2")));
    check_matches!(all_the_things, "0:09az.-+~:-0", (0, "09az.-+~:", Some("0")));

    check_parse_fails!(empty, "", Error::Empty);
    check_parse_fails!(empty_space, "  ", Error::Empty);
    check_parse_fails!(empty_epoch, ":1.0", Error::EmptyEpoch);
    check_parse_fails!(bad_epoch, "a:1.0", Error::NonDecimalEpoch);
    check_parse_fails!(negative_epoch, "-1:1.0-1", Error::NonDecimalEpoch);
    check_parse_fails!(epoch_too_large, "333333333333333333:3", Error::EpochOverflow);
    check_parse_fails!(empty_revision, "7-", Error::EmptyRevision);
    check_parse_fails!(starting_letter, "abc3-0", Error::MissingLeadingDigit);
    check_parse_fails!(bare_epoch, "1:", Error::MissingLeadingDigit);
    check_parse_fails!(space_twixt, "0:0 0-1", Error::InvalidCharacter);
    check_parse_fails!(invalid_chars1, "1.0@", Error::InvalidCharacter);
    check_parse_fails!(invalid_chars2, "1.0#", Error::InvalidCharacter);

    check_canonical!(canonical_plain, "1.2.3", "1.2.3");
    check_canonical!(canonical_zero_epoch, "0:1.2", "1.2");
    check_canonical!(canonical_epoch, "2:1.2", "2:1.2");
    check_canonical!(canonical_zero_revision, "1.2-0", "1.2");
    check_canonical!(canonical_revision, "1.2-1", "1.2-1");
    check_canonical!(canonical_trailing_zero, "1.0.0", "1.0");
    check_canonical!(canonical_trailing_zeros, "1.0.0.0", "1.0");
    check_canonical!(canonical_keeps_first_zero, "0.0", "0");
    check_canonical!(canonical_leading_zeros, "1.02", "1.2");
    check_canonical!(canonical_keeps_colon_epoch, "0:1:2", "0:1:2");
    check_canonical!(canonical_semicolon, "1;1.0", "1:1.0");
    check_canonical!(canonical_trailing_dot, "1.2.", "1.2");
    // a zero group behind a colon stays; stripping it would leave the
    // separator dangling
    check_canonical!(canonical_colon_zero_kept, "0:1:0", "0:1:0");
    check_canonical!(canonical_colon_zero_pair, "0:1:0.0", "0:1:0");

    #[test]
    fn canonicalization_is_idempotent() {
        for v in ["1.0.0", "0:1.2-0", "3:4.5~rc1-1.0", "1.02-03", "0:1:0"] {
            let first: Version = v.parse().unwrap();
            let second: Version = first.to_string().parse().unwrap();
            assert_eq!(first, second);
            assert_eq!(first.to_string(), second.to_string());
        }
    }

    #[test]
    fn filename_form() {
        let v: Version = "1:2.0-1".parse().unwrap();
        assert_eq!("1;2.0-1", v.to_filename_string());
        let back: Version = v.to_filename_string().parse().unwrap();
        assert_eq!(v, back);
    }
}

// vim: foldmethod=marker

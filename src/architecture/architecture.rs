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

//! Architecture strings, triplets and patterns.

use std::str::FromStr;

/// A package or target architecture.
///
/// Binary architectures are written as a tuple `os[-vendor]-cpu` (the vendor
/// is rarely spelled out). Any tuple position may hold the wildcard `any`,
/// which turns the architecture into a pattern; a bare `any` is the pattern
/// matching everything. Two singletons exist besides the tuples:
/// architecture-independent packages use `all`, and source packages use
/// `source` (also spelled `src`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Architecture {
    /// Architecture independent (`Architecture: all`) packages.
    All,

    /// Source packages (`source` or `src`).
    Source,

    /// A binary architecture tuple, possibly holding `any` wildcards.
    Triplet {
        /// Operating system, or `any`.
        os: String,

        /// Vendor, or `any`. Almost always `any` in practice; a dependency
        /// may ask for vendor matching to be ignored entirely.
        vendor: String,

        /// Processor, or `any`.
        cpu: String,
    },
}

/// Error conditions which may be encountered when parsing a String into an
/// [Architecture].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The architecture string (or one of its tuple positions) is empty.
    Empty,

    /// The architecture contains a character outside `a-z`, `0-9`, `-`.
    InvalidCharacter,
}
crate::errors::error_enum!(Error);

fn valid_token(token: &str) -> Result<(), Error> {
    if token.is_empty() {
        return Err(Error::Empty);
    }
    if !token
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
    {
        return Err(Error::InvalidCharacter);
    }
    Ok(())
}

impl Architecture {
    /// The pattern matching every architecture (`any`).
    pub fn any() -> Self {
        Architecture::Triplet {
            os: "any".to_owned(),
            vendor: "any".to_owned(),
            cpu: "any".to_owned(),
        }
    }

    /// True for `Architecture: all` packages.
    pub fn is_all(&self) -> bool {
        matches!(self, Architecture::All)
    }

    /// True for source packages.
    pub fn is_source(&self) -> bool {
        matches!(self, Architecture::Source)
    }

    /// True if any tuple position holds the `any` wildcard.
    pub fn is_pattern(&self) -> bool {
        match self {
            Architecture::Triplet { os, vendor, cpu } => {
                os == "any" || vendor == "any" || cpu == "any"
            }
            _ => false,
        }
    }

    /// True when this is a fully specified binary tuple, usable as the
    /// architecture of an installation target.
    pub fn is_concrete(&self) -> bool {
        matches!(self, Architecture::Triplet { .. }) && !self.is_pattern()
    }

    /// Whether this architecture is matched by `pattern`.
    ///
    /// The literal patterns `any`, `any-any` and `any-any-any` match
    /// everything. Otherwise tuples match position by position, with `any`
    /// as the wildcard on either side; `all` and `source` only match
    /// themselves. When `ignore_vendor` is set the vendor position always
    /// matches.
    pub fn matches(&self, pattern: &Architecture, ignore_vendor: bool) -> bool {
        if let Architecture::Triplet { os, vendor, cpu } = pattern {
            if os == "any" && vendor == "any" && cpu == "any" {
                return true;
            }
        }
        match (self, pattern) {
            (Architecture::All, Architecture::All) => true,
            (Architecture::Source, Architecture::Source) => true,
            (
                Architecture::Triplet { os, vendor, cpu },
                Architecture::Triplet {
                    os: pos,
                    vendor: pvendor,
                    cpu: pcpu,
                },
            ) => {
                let field = |a: &str, b: &str| a == b || a == "any" || b == "any";
                field(os, pos)
                    && (ignore_vendor || field(vendor, pvendor))
                    && field(cpu, pcpu)
            }
            _ => false,
        }
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(arch: &str) -> Result<Self, Error> {
        let arch = arch.trim().to_ascii_lowercase();
        match arch.as_str() {
            "" => return Err(Error::Empty),
            "all" => return Ok(Architecture::All),
            "source" | "src" => return Ok(Architecture::Source),
            "any" => return Ok(Architecture::any()),
            _ => {}
        }

        let parts = arch.split('-').collect::<Vec<_>>();
        let (os, vendor, cpu) = match parts[..] {
            [cpu] => ("any", "any".to_owned(), cpu),
            [os, cpu] => (os, "any".to_owned(), cpu),
            [os, .., cpu] => (os, parts[1..parts.len() - 1].join("-"), cpu),
            _ => return Err(Error::Empty),
        };
        valid_token(os)?;
        for token in vendor.split('-') {
            valid_token(token)?;
        }
        valid_token(cpu)?;
        Ok(Architecture::Triplet {
            os: os.to_owned(),
            vendor,
            cpu: cpu.to_owned(),
        })
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::All => write!(f, "all"),
            Architecture::Source => write!(f, "source"),
            Architecture::Triplet { os, vendor, cpu } => {
                if os == "any" && vendor == "any" && cpu == "any" {
                    write!(f, "any")
                } else if vendor == "any" {
                    if os == "any" {
                        write!(f, "any-{}", cpu)
                    } else {
                        write!(f, "{}-{}", os, cpu)
                    }
                } else {
                    write!(f, "{}-{}-{}", os, vendor, cpu)
                }
            }
        }
    }
}

#[cfg(feature = "serde")]
mod serde {
    use super::Architecture;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Architecture {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            String::serialize(&self.to_string(), serializer)
        }
    }

    impl<'de> Deserialize<'de> for Architecture {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            s.parse().map_err(|e| D::Error::custom(format!("{:?}", e)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_parse {
        ($name:ident, $arch:expr, $display:expr) => {
            #[test]
            fn $name() {
                let arch: Architecture = $arch.parse().unwrap();
                assert_eq!($display, arch.to_string());
            }
        };
    }

    macro_rules! check_parse_fails {
        ($name:ident, $arch:expr) => {
            #[test]
            fn $name() {
                assert!($arch.parse::<Architecture>().is_err());
            }
        };
    }

    macro_rules! check_match {
        ($name:ident, $arch:expr, $pattern:expr, $check:expr) => {
            #[test]
            fn $name() {
                let arch: Architecture = $arch.parse().unwrap();
                let pattern: Architecture = $pattern.parse().unwrap();
                assert_eq!($check, arch.matches(&pattern, false));
            }
        };
    }

    check_parse!(parse_all, "all", "all");
    check_parse!(parse_source, "source", "source");
    check_parse!(parse_src, "src", "source");
    check_parse!(parse_any, "any", "any");
    check_parse!(parse_pair, "linux-amd64", "linux-amd64");
    check_parse!(parse_triplet, "linux-m2osw-amd64", "linux-m2osw-amd64");
    check_parse!(parse_cpu_only, "amd64", "any-amd64");
    check_parse!(parse_any_pair, "any-any", "any");
    check_parse!(parse_folds_case, "Linux-AMD64", "linux-amd64");

    check_parse_fails!(parse_empty, "");
    check_parse_fails!(parse_empty_part, "linux-");
    check_parse_fails!(parse_bad_char, "linux_amd64");

    check_match!(match_exact, "linux-amd64", "linux-amd64", true);
    check_match!(match_any, "linux-amd64", "any", true);
    check_match!(match_any_any, "linux-amd64", "any-any", true);
    check_match!(match_any_any_any, "linux-amd64", "any-any-any", true);
    check_match!(match_os_wildcard, "linux-amd64", "any-amd64", true);
    check_match!(match_cpu_wildcard, "linux-amd64", "linux-any", true);
    check_match!(match_wrong_cpu, "linux-amd64", "linux-arm64", false);
    check_match!(match_wrong_os, "freebsd-amd64", "linux-amd64", false);
    check_match!(match_all_vs_any, "all", "any", true);
    check_match!(match_all_vs_tuple, "all", "linux-amd64", false);
    check_match!(match_source, "src", "source", true);
    check_match!(match_vendor_wildcard, "linux-m2osw-amd64", "linux-amd64", true);

    #[test]
    fn vendor_ignored_on_request() {
        let arch: Architecture = "linux-acme-amd64".parse().unwrap();
        let pattern: Architecture = "linux-m2osw-amd64".parse().unwrap();
        assert!(!arch.matches(&pattern, false));
        assert!(arch.matches(&pattern, true));
    }

    #[test]
    fn concreteness() {
        let arch: Architecture = "linux-amd64".parse().unwrap();
        assert!(arch.is_concrete());
        assert!(!arch.is_pattern());
        assert!(!"any-amd64".parse::<Architecture>().unwrap().is_concrete());
        assert!(!"all".parse::<Architecture>().unwrap().is_concrete());
    }
}

// vim: foldmethod=marker

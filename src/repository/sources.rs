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

use super::Error;
use std::str::FromStr;

/// The type of one `sources.list` entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceType {
    /// Binary packages, Debian layout.
    Deb,

    /// Source packages, Debian layout.
    DebSrc,

    /// Binary packages, wpkg layout.
    Wpkg,

    /// Source packages, wpkg layout.
    WpkgSrc,
}

impl SourceType {
    /// Return the [SourceType] as a borrowed string ref.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deb => "deb",
            Self::DebSrc => "deb-src",
            Self::Wpkg => "wpkg",
            Self::WpkgSrc => "wpkg-src",
        }
    }

    /// Whether the entry carries source packages.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::DebSrc | Self::WpkgSrc)
    }
}

impl FromStr for SourceType {
    type Err = Error;

    fn from_str(kind: &str) -> Result<Self, Error> {
        Ok(match kind {
            "deb" => Self::Deb,
            "deb-src" => Self::DebSrc,
            "wpkg" => Self::Wpkg,
            "wpkg-src" => Self::WpkgSrc,
            _ => return Err(Error::InvalidSourceType(kind.to_owned())),
        })
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a `sources.list` file:
///
/// ```text
/// wpkg [arch=linux-amd64] file:///srv/repository stable main contrib
/// wpkg file:///srv/flat-repository ./
/// ```
///
/// A distribution ending in `/` names an exact directory and takes no
/// components; otherwise at least one component is required.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    /// The type of packages this source carries.
    pub source_type: SourceType,

    /// Bracketed `key=value` options, in file order.
    pub options: Vec<(String, String)>,

    /// Repository URI (or plain directory path).
    pub uri: String,

    /// Distribution below the repository root.
    pub distribution: String,

    /// Archive components; empty for exact-path distributions.
    pub components: Vec<String>,
}

impl SourceEntry {
    /// Look up a bracketed option by key.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl FromStr for SourceEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Error> {
        let bad = || Error::InvalidSourceLine(line.to_owned());
        let mut tokens = line.split_whitespace().peekable();
        let source_type: SourceType = tokens.next().ok_or_else(bad)?.parse()?;

        let mut options = vec![];
        if matches!(tokens.peek(), Some(token) if token.starts_with('[')) {
            // bracketed options run until the closing bracket; both the
            // packed ([a=b]) and spaced ([ a=b ]) spellings are accepted
            let mut raw = vec![];
            let mut closed = false;
            for token in tokens.by_ref() {
                let token = token.strip_prefix('[').unwrap_or(token);
                let token = match token.strip_suffix(']') {
                    Some(token) => {
                        closed = true;
                        token
                    }
                    None => token,
                };
                if !token.is_empty() {
                    raw.push(token.to_owned());
                }
                if closed {
                    break;
                }
            }
            if !closed {
                return Err(bad());
            }
            for option in raw {
                let (key, value) = option.split_once('=').ok_or_else(bad)?;
                options.push((key.to_owned(), value.to_owned()));
            }
        }

        let uri = tokens.next().ok_or_else(bad)?.to_owned();
        let distribution = tokens.next().ok_or_else(bad)?.to_owned();
        let components = tokens.map(|v| v.to_owned()).collect::<Vec<_>>();

        if distribution.ends_with('/') {
            if !components.is_empty() {
                return Err(Error::UnexpectedComponents(line.to_owned()));
            }
        } else if components.is_empty() {
            return Err(Error::MissingComponents(line.to_owned()));
        }

        Ok(SourceEntry {
            source_type,
            options,
            uri,
            distribution,
            components,
        })
    }
}

impl std::fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source_type)?;
        if !self.options.is_empty() {
            write!(
                f,
                " [{}]",
                self.options
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(" ")
            )?;
        }
        write!(f, " {} {}", self.uri, self.distribution)?;
        for component in &self.components {
            write!(f, " {}", component)?;
        }
        Ok(())
    }
}

/// Parse a whole `sources.list`: one entry per line, blank lines and `#`
/// comments skipped.
pub fn parse_sources(text: &str) -> Result<Vec<SourceEntry>, Error> {
    let mut ret = vec![];
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        ret.push(line.parse()?);
    }
    Ok(ret)
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_source_fails {
        ($name:ident, $line:expr) => {
            #[test]
            fn $name() {
                assert!($line.parse::<SourceEntry>().is_err());
            }
        };
    }

    #[test]
    fn parse_simple() {
        let entry: SourceEntry = "wpkg file:///srv/repo stable main contrib".parse().unwrap();
        assert_eq!(SourceType::Wpkg, entry.source_type);
        assert_eq!("file:///srv/repo", entry.uri);
        assert_eq!("stable", entry.distribution);
        assert_eq!(vec!["main".to_owned(), "contrib".to_owned()], entry.components);
    }

    #[test]
    fn parse_exact_path() {
        let entry: SourceEntry = "deb /srv/repo ./".parse().unwrap();
        assert_eq!(SourceType::Deb, entry.source_type);
        assert!(entry.components.is_empty());
    }

    #[test]
    fn parse_options() {
        let entry: SourceEntry = "wpkg [arch=linux-amd64 trusted=yes] /srv/repo ./"
            .parse()
            .unwrap();
        assert_eq!(Some("linux-amd64"), entry.option("arch"));
        assert_eq!(Some("yes"), entry.option("trusted"));
        assert_eq!(None, entry.option("whatever"));
    }

    check_source_fails!(rejects_unknown_type, "rpm /srv/repo ./");
    check_source_fails!(rejects_missing_components, "wpkg /srv/repo stable");
    check_source_fails!(rejects_extra_components, "wpkg /srv/repo ./ main");
    check_source_fails!(rejects_unclosed_options, "wpkg [a=b /srv/repo ./");
    check_source_fails!(rejects_empty, "wpkg");

    #[test]
    fn round_trips() {
        for line in [
            "wpkg file:///srv/repo stable main",
            "deb-src [arch=linux-amd64] /repo ./",
            "wpkg-src /repo experimental main contrib",
        ] {
            let entry: SourceEntry = line.parse().unwrap();
            assert_eq!(line, entry.to_string());
        }
    }

    #[test]
    fn parses_files_with_comments() {
        let sources = parse_sources(
            "# repositories\n\nwpkg /srv/a ./\nwpkg /srv/b stable main\n",
        )
        .unwrap();
        assert_eq!(2, sources.len());
    }
}

// vim: foldmethod=marker

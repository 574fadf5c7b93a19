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

/// Lifecycle status of a package in the database, stored in the `X-Status`
/// field of its `wpkg-status` file.
///
/// The forward path is `Not-Installed` → `Half-Installed` → `Unpacked` →
/// `Half-Configured` → `Installed`; removal walks `Removing` →
/// `Config-Files` → `Purging` → `Not-Installed`. The `Half-*` states are
/// where a package lands when a maintenance script fails and its recovery
/// script fails too.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PackageStatus {
    /// The package is not installed (or is fully purged).
    NotInstalled,

    /// Only the configuration files remain on disk.
    ConfigFiles,

    /// An unpack or removal is underway (or failed part way).
    HalfInstalled,

    /// The files are on disk but the package was not configured yet.
    Unpacked,

    /// Configuration started but did not complete.
    HalfConfigured,

    /// Fully installed and configured.
    Installed,

    /// The files of the package are being removed.
    Removing,

    /// The configuration files of the package are being purged.
    Purging,
}

impl PackageStatus {
    /// Return the [PackageStatus] as a borrowed string ref, in the
    /// canonical hyphenated spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotInstalled => "Not-Installed",
            Self::ConfigFiles => "Config-Files",
            Self::HalfInstalled => "Half-Installed",
            Self::Unpacked => "Unpacked",
            Self::HalfConfigured => "Half-Configured",
            Self::Installed => "Installed",
            Self::Removing => "Removing",
            Self::Purging => "Purging",
        }
    }

    /// Whether this status marks a package needing repair before anything
    /// else can be done with it.
    pub fn needs_repair(&self) -> bool {
        matches!(
            self,
            Self::HalfInstalled | Self::HalfConfigured | Self::Removing | Self::Purging
        )
    }
}

impl FromStr for PackageStatus {
    type Err = Error;

    fn from_str(status: &str) -> Result<Self, Error> {
        Ok(match status {
            "Not-Installed" => Self::NotInstalled,
            "Config-Files" => Self::ConfigFiles,
            "Half-Installed" => Self::HalfInstalled,
            "Unpacked" => Self::Unpacked,
            "Half-Configured" => Self::HalfConfigured,
            "Installed" => Self::Installed,
            "Removing" => Self::Removing,
            "Purging" => Self::Purging,
            _ => return Err(Error::InvalidStatus(status.to_owned())),
        })
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The selection of a package, stored in the `X-Selection` field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Selection {
    /// Installed on purpose; the default when nothing else is recorded.
    #[default]
    Normal,

    /// Installed automatically to satisfy a dependency; `autoremove` may
    /// take it away once nothing depends on it.
    Auto,

    /// Held: not to be upgraded, downgraded or removed without the hold
    /// force.
    Hold,

    /// Rejected: not to be installed at all.
    Reject,
}

impl Selection {
    /// Return the [Selection] as a borrowed string ref.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Auto => "auto",
            Self::Hold => "hold",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for Selection {
    type Err = Error;

    fn from_str(selection: &str) -> Result<Self, Error> {
        let folded = selection.to_ascii_lowercase();
        Ok(match folded.as_str() {
            "normal" => Self::Normal,
            "auto" => Self::Auto,
            "hold" => Self::Hold,
            "reject" => Self::Reject,
            _ => return Err(Error::InvalidSelection(selection.to_owned())),
        })
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            PackageStatus::NotInstalled,
            PackageStatus::ConfigFiles,
            PackageStatus::HalfInstalled,
            PackageStatus::Unpacked,
            PackageStatus::HalfConfigured,
            PackageStatus::Installed,
            PackageStatus::Removing,
            PackageStatus::Purging,
        ] {
            assert_eq!(status, status.as_str().parse().unwrap());
        }
        assert!("Sideways".parse::<PackageStatus>().is_err());
    }

    #[test]
    fn repair_states() {
        assert!(PackageStatus::HalfInstalled.needs_repair());
        assert!(PackageStatus::Removing.needs_repair());
        assert!(!PackageStatus::Installed.needs_repair());
        assert!(!PackageStatus::Unpacked.needs_repair());
    }

    #[test]
    fn selection_round_trips() {
        for selection in [
            Selection::Normal,
            Selection::Auto,
            Selection::Hold,
            Selection::Reject,
        ] {
            assert_eq!(selection, selection.as_str().parse().unwrap());
        }
        assert_eq!(Selection::Hold, "Hold".parse().unwrap());
        assert!("whatever".parse::<Selection>().is_err());
    }
}

// vim: foldmethod=marker

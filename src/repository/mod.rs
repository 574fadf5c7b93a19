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

//! The `repository` module reads package repositories.
//!
//! A repository is a directory of archives plus an index tarball whose
//! members are named `<name>_<version>[_<arch>].ctrl` and hold the
//! control fields of the corresponding archive (plus its md5sum, size and
//! index date). The index is created on the first pass over a local
//! repository that has none yet.
//!
//! Which repositories a target uses is configured in its
//! `core/sources.list`, parsed by [SourceEntry].

mod index;
mod sources;

pub use index::{
    create_index, ensure_index, load_index, read_repository, IndexEntry, INDEX_FILENAME,
};
pub use sources::{parse_sources, SourceEntry, SourceType};

use std::path::PathBuf;

/// Error conditions which may be encountered reading repositories and
/// their indexes.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An underlying I/O operation failed on the given path.
    Io(PathBuf, std::io::Error),

    /// A `sources.list` entry has an unrecognized type.
    InvalidSourceType(String),

    /// A `sources.list` line did not parse.
    InvalidSourceLine(String),

    /// A `sources.list` line names a distribution requiring components
    /// but provides none.
    MissingComponents(String),

    /// A `sources.list` line names an exact-path distribution but still
    /// provides components.
    UnexpectedComponents(String),

    /// An index member is not named `<name>_<version>[_<arch>].ctrl`.
    InvalidIndexMember(String),

    /// An index member's name does not agree with the control fields it
    /// contains.
    FieldMismatch {
        /// The offending member name.
        member: String,
        /// The field that disagreed.
        field: &'static str,
    },

    /// An archive in the repository could not be decoded.
    Archive(crate::archive::Error),

    /// A control paragraph inside the index could not be parsed.
    Control(crate::control::Error),

    /// A version inside the index could not be parsed.
    Version(crate::version::Error),

    /// An architecture inside the index could not be parsed.
    Architecture(crate::architecture::Error),
}
crate::errors::error_enum!(Error);

impl From<crate::archive::Error> for Error {
    fn from(err: crate::archive::Error) -> Self {
        Error::Archive(err)
    }
}

impl From<crate::control::Error> for Error {
    fn from(err: crate::control::Error) -> Self {
        Error::Control(err)
    }
}

impl From<crate::version::Error> for Error {
    fn from(err: crate::version::Error) -> Self {
        Error::Version(err)
    }
}

impl From<crate::architecture::Error> for Error {
    fn from(err: crate::architecture::Error) -> Self {
        Error::Architecture(err)
    }
}

// vim: foldmethod=marker

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

//! The `archive` module reads and writes binary package files.
//!
//! A binary package is an `ar` archive holding a `debian-binary` version
//! marker, a `control.tar[.gz]` with the control fields, conffile list,
//! checksums and maintenance scripts, and a `data.tar[.gz]` with the files
//! to install.
//!
//! The installer core consumes packages through [DebReader], which decodes
//! the whole archive into memory. [DebBuilder] produces packages and is
//! used by the repository index tooling and the test suites.

mod builder;
mod deb;

pub use builder::DebBuilder;
pub use deb::{DataEntry, DebReader, EntryKind, SCRIPT_NAMES};

use std::path::PathBuf;

/// Error conditions which may be encountered reading or writing a binary
/// package.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An underlying I/O operation failed.
    Io(std::io::Error),

    /// A required archive member is missing.
    MissingMember(&'static str),

    /// An archive member uses a compression this build does not decode.
    UnsupportedCompression(String),

    /// A member path is absolute or walks out of the extraction root.
    UnsafePath(PathBuf),

    /// The control member could not be parsed.
    Control(crate::control::Error),

    /// A required control field is missing.
    MissingField(&'static str),

    /// The `Version` field could not be parsed.
    Version(crate::version::Error),

    /// The `Architecture` field could not be parsed.
    Architecture(crate::architecture::Error),
}
crate::errors::error_enum!(Error);

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::control::ControlFile;

    fn control(name: &str, version: &str) -> ControlFile {
        let mut ctrl = ControlFile::new();
        ctrl.set_field("Package", name);
        ctrl.set_field("Version", version);
        ctrl.set_field("Architecture", "linux-amd64");
        ctrl
    }

    #[test]
    fn build_and_read_back() {
        let deb = DebBuilder::new(control("foo", "1.2-1"))
            .set_mtime(1000)
            .install_dir("usr/bin")
            .install_file("usr/bin/foo", b"#!/bin/sh\n", 0o755)
            .install_conffile("etc/foo.conf", b"key = value\n")
            .install_symlink("usr/bin/foo-alias", "foo")
            .script("postinst", b"#!/bin/sh\nexit 0\n")
            .build()
            .unwrap();

        let reader = DebReader::parse(&deb).unwrap();
        assert_eq!("foo", reader.name());
        assert_eq!("1.2-1", reader.version().to_string());
        assert_eq!("linux-amd64", reader.architecture().to_string());
        assert!(reader.is_conffile("etc/foo.conf"));
        assert!(reader.is_conffile("/etc/foo.conf"));
        assert!(!reader.is_conffile("usr/bin/foo"));
        assert!(reader.scripts().contains_key("postinst"));
        assert!(!reader.scripts().contains_key("preinst"));

        let entries = reader.data_entries();
        assert_eq!(4, entries.len());
        assert_eq!(EntryKind::Directory, entries[0].kind);
        assert_eq!("usr/bin", entries[0].path.display().to_string());
        assert_eq!(EntryKind::File, entries[1].kind);
        assert_eq!(b"#!/bin/sh\n".to_vec(), entries[1].content);
        assert_eq!(0o755, entries[1].mode);
        assert_eq!(EntryKind::File, entries[2].kind);
        assert_eq!(
            EntryKind::Symlink {
                target: "foo".into()
            },
            entries[3].kind
        );
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut ctrl = ControlFile::new();
        ctrl.set_field("Package", "foo");
        let deb = DebBuilder::new(ctrl).build().unwrap();
        assert!(matches!(
            DebReader::parse(&deb),
            Err(Error::MissingField("Version"))
        ));
    }

    #[test]
    fn absolute_paths_are_rejected() {
        // a hand-built data.tar with an absolute member path
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(2);
        header.set_mode(0o644);
        // tar::Builder::append_data validates the path and rejects `..`, so
        // the malicious name is written directly into the raw header to
        // exercise our own path check instead of the tar crate's.
        header.as_old_mut().name[.."../evil".len()].copy_from_slice(b"../evil");
        header.set_cksum();
        builder.append(&header, &b"hi"[..]).unwrap();
        let data_tar = builder.into_inner().unwrap();

        let mut out = vec![];
        {
            let mut ar_builder = ar::Builder::new(&mut out);
            let control = control("foo", "1.0").to_string().into_bytes();
            let mut control_builder = tar::Builder::new(Vec::new());
            let mut header = tar::Header::new_gnu();
            header.set_size(control.len() as u64);
            header.set_mode(0o644);
            control_builder
                .append_data(&mut header, "control", &control[..])
                .unwrap();
            let control_tar = control_builder.into_inner().unwrap();
            let header = ar::Header::new(b"control.tar".to_vec(), control_tar.len() as u64);
            ar_builder.append(&header, &control_tar[..]).unwrap();
            let header = ar::Header::new(b"data.tar".to_vec(), data_tar.len() as u64);
            ar_builder.append(&header, &data_tar[..]).unwrap();
        }

        assert!(matches!(
            DebReader::parse(&out),
            Err(Error::UnsafePath(_))
        ));
    }
}

// vim: foldmethod=marker

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
use crate::architecture::Architecture;
use crate::archive::DebReader;
use crate::control::{fields, ControlFile};
use crate::version::Version;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use md5::{Digest, Md5};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Name of the index archive inside a repository directory.
pub const INDEX_FILENAME: &str = "index.tar.gz";

/// One candidate read from a repository index: the control fields of an
/// archive that can be downloaded and installed.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    /// Package name, validated against the member name.
    pub name: String,

    /// Package version, validated against the member name.
    pub version: Version,

    /// Package architecture; `None` for source packages whose member name
    /// carries no architecture.
    pub architecture: Option<Architecture>,

    /// The full control fields, including `Package-md5sum`,
    /// `Package-Size` and `Index-Date`.
    pub control: ControlFile,
}

impl IndexEntry {
    /// The file name of the archive this entry describes.
    pub fn deb_filename(&self) -> String {
        match &self.architecture {
            Some(arch) => format!(
                "{}_{}_{}.deb",
                self.name,
                self.version.to_filename_string(),
                arch
            ),
            None => format!("{}_{}.deb", self.name, self.version.to_filename_string()),
        }
    }

    /// The path of the archive inside its repository.
    pub fn archive_path(&self, repository: &Path) -> PathBuf {
        repository.join(self.deb_filename())
    }

    /// Whether this candidate can be installed on the given target
    /// architecture.
    pub fn compatible_with(&self, target: &Architecture, ignore_vendor: bool) -> bool {
        match &self.architecture {
            Some(arch) => {
                arch.is_all() || target.matches(arch, ignore_vendor) || arch.matches(target, ignore_vendor)
            }
            None => true,
        }
    }
}

fn member_name(reader: &DebReader) -> String {
    let arch = reader.architecture();
    if arch.is_source() {
        format!(
            "{}_{}.ctrl",
            reader.name(),
            reader.version().to_filename_string()
        )
    } else {
        format!(
            "{}_{}_{}.ctrl",
            reader.name(),
            reader.version().to_filename_string(),
            arch
        )
    }
}

fn scan_for_debs(repository: &Path, recursive: bool) -> Result<Vec<PathBuf>, Error> {
    let mut ret = vec![];
    let mut stack = vec![repository.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries =
            std::fs::read_dir(&dir).map_err(|err| Error::Io(dir.clone(), err))?;
        for entry in entries {
            let entry = entry.map_err(|err| Error::Io(dir.clone(), err))?;
            let path = entry.path();
            if path.is_dir() {
                if recursive {
                    stack.push(path);
                }
            } else if path.extension().map(|ext| ext == "deb").unwrap_or(false) {
                ret.push(path);
            }
        }
    }
    ret.sort();
    Ok(ret)
}

/// Build an index archive for a local repository directory: one `.ctrl`
/// member per archive, holding its control fields plus `Package-md5sum`,
/// `Package-Size` and `Index-Date`.
pub fn create_index(repository: &Path, recursive: bool) -> Result<Vec<u8>, Error> {
    let index_date = chrono::Utc::now().to_rfc2822();
    let mut builder = tar::Builder::new(Vec::new());

    for path in scan_for_debs(repository, recursive)? {
        let bytes = std::fs::read(&path).map_err(|err| Error::Io(path.clone(), err))?;
        let reader = DebReader::parse(&bytes)?;

        let mut control = reader.control().clone();
        control.set_field(fields::PACKAGE_MD5SUM, hex::encode(Md5::digest(&bytes)));
        control.set_field(fields::PACKAGE_SIZE, bytes.len().to_string());
        control.set_field(fields::INDEX_DATE, index_date.clone());

        let content = control.to_string().into_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_uid(0);
        header.set_gid(0);
        builder
            .append_data(&mut header, member_name(&reader), &content[..])
            .map_err(|err| Error::Io(path.clone(), err))?;
    }

    let tarball = builder
        .into_inner()
        .map_err(|err| Error::Io(repository.to_path_buf(), err))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&tarball)
        .map_err(|err| Error::Io(repository.to_path_buf(), err))?;
    encoder
        .finish()
        .map_err(|err| Error::Io(repository.to_path_buf(), err))
}

/// Make sure a local repository has an index, creating it on the first
/// pass, and return its path.
pub fn ensure_index(repository: &Path, recursive: bool) -> Result<PathBuf, Error> {
    let path = repository.join(INDEX_FILENAME);
    if !path.exists() {
        let index = create_index(repository, recursive)?;
        std::fs::write(&path, index).map_err(|err| Error::Io(path.clone(), err))?;
    }
    Ok(path)
}

/// Decompress and decode an index archive, validating every member name
/// against the control fields it contains.
pub fn load_index(bytes: &[u8]) -> Result<Vec<IndexEntry>, Error> {
    let mut tarball = vec![];
    GzDecoder::new(Cursor::new(bytes))
        .read_to_end(&mut tarball)
        .map_err(|err| Error::Io(PathBuf::from(INDEX_FILENAME), err))?;

    let mut ret = vec![];
    let mut archive = tar::Archive::new(Cursor::new(&tarball[..]));
    for entry in archive
        .entries()
        .map_err(|err| Error::Io(PathBuf::from(INDEX_FILENAME), err))?
    {
        let mut entry = entry.map_err(|err| Error::Io(PathBuf::from(INDEX_FILENAME), err))?;
        let member = entry
            .path()
            .map_err(|err| Error::Io(PathBuf::from(INDEX_FILENAME), err))?
            .to_string_lossy()
            .to_string();
        let member = member.trim_start_matches("./").to_owned();
        if member.is_empty() || member.ends_with('/') {
            continue;
        }

        let Some(stem) = member.strip_suffix(".ctrl") else {
            return Err(Error::InvalidIndexMember(member));
        };
        let parts = stem.split('_').collect::<Vec<_>>();
        let (name, version, architecture) = match parts[..] {
            [name, version] => (name, version, None),
            [name, version, arch] => (
                name,
                version,
                Some(arch.parse::<Architecture>()?),
            ),
            _ => return Err(Error::InvalidIndexMember(member)),
        };
        let version: Version = version.parse()?;

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|err| Error::Io(PathBuf::from(&member), err))?;
        let control = ControlFile::parse(&content)?;

        // the decomposed member name must agree with the fields inside
        let field_matches = |field: &str, expected: &str| {
            control
                .field(field)
                .map(|value| value == expected)
                .unwrap_or(false)
        };
        if !field_matches(fields::PACKAGE, name) {
            return Err(Error::FieldMismatch {
                member: member.clone(),
                field: fields::PACKAGE,
            });
        }
        let control_version = control
            .field(fields::VERSION)
            .and_then(|value| value.parse::<Version>().ok());
        if control_version.as_ref() != Some(&version) {
            return Err(Error::FieldMismatch {
                member: member.clone(),
                field: fields::VERSION,
            });
        }
        if let Some(arch) = &architecture {
            let control_arch = control
                .field(fields::ARCHITECTURE)
                .and_then(|value| value.parse::<Architecture>().ok());
            if control_arch.as_ref() != Some(arch) {
                return Err(Error::FieldMismatch {
                    member: member.clone(),
                    field: fields::ARCHITECTURE,
                });
            }
        }

        ret.push(IndexEntry {
            name: name.to_owned(),
            version,
            architecture,
            control,
        });
    }
    Ok(ret)
}

/// [ensure_index] then [load_index] in one call.
pub fn read_repository(repository: &Path, recursive: bool) -> Result<Vec<IndexEntry>, Error> {
    let path = ensure_index(repository, recursive)?;
    let bytes = std::fs::read(&path).map_err(|err| Error::Io(path.clone(), err))?;
    load_index(&bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::DebBuilder;

    fn write_deb(dir: &Path, name: &str, version: &str, arch: &str) {
        let mut ctrl = ControlFile::new();
        ctrl.set_field(fields::PACKAGE, name);
        ctrl.set_field(fields::VERSION, version);
        ctrl.set_field(fields::ARCHITECTURE, arch);
        let deb = DebBuilder::new(ctrl)
            .install_file("usr/share/doc", b"hi\n", 0o644)
            .build()
            .unwrap();
        let version: Version = version.parse().unwrap();
        let filename = format!("{}_{}_{}.deb", name, version.to_filename_string(), arch);
        std::fs::write(dir.join(filename), deb).unwrap();
    }

    #[test]
    fn create_and_read_index() {
        let dir = tempfile::tempdir().unwrap();
        write_deb(dir.path(), "foo", "1.0", "linux-amd64");
        write_deb(dir.path(), "bar", "1:2.0-1", "all");

        let entries = read_repository(dir.path(), false).unwrap();
        assert!(dir.path().join(INDEX_FILENAME).exists());
        assert_eq!(2, entries.len());

        let bar = entries.iter().find(|e| e.name == "bar").unwrap();
        assert_eq!("1:2.0-1", bar.version.to_string());
        assert_eq!("bar_1;2.0-1_all.deb", bar.deb_filename());
        assert!(bar.control.field(fields::PACKAGE_MD5SUM).is_some());
        assert!(bar.control.field(fields::PACKAGE_SIZE).is_some());
        assert!(bar.control.field(fields::INDEX_DATE).is_some());

        // the second read goes through the existing index
        let again = read_repository(dir.path(), false).unwrap();
        assert_eq!(2, again.len());
    }

    #[test]
    fn architecture_compatibility() {
        let target: Architecture = "linux-amd64".parse().unwrap();
        let dir = tempfile::tempdir().unwrap();
        write_deb(dir.path(), "foo", "1.0", "linux-amd64");
        write_deb(dir.path(), "bar", "1.0", "all");
        write_deb(dir.path(), "baz", "1.0", "linux-arm64");

        let entries = read_repository(dir.path(), false).unwrap();
        let by_name = |name: &str| entries.iter().find(|e| e.name == name).unwrap();
        assert!(by_name("foo").compatible_with(&target, false));
        assert!(by_name("bar").compatible_with(&target, false));
        assert!(!by_name("baz").compatible_with(&target, false));
    }

    #[test]
    fn member_name_mismatch_is_rejected() {
        let mut ctrl = ControlFile::new();
        ctrl.set_field(fields::PACKAGE, "other");
        ctrl.set_field(fields::VERSION, "1.0");
        ctrl.set_field(fields::ARCHITECTURE, "all");
        let content = ctrl.to_string().into_bytes();

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, "foo_1.0_all.ctrl", &content[..])
            .unwrap();
        let tarball = builder.into_inner().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tarball).unwrap();
        let index = encoder.finish().unwrap();

        assert!(matches!(
            load_index(&index),
            Err(Error::FieldMismatch {
                field: fields::PACKAGE,
                ..
            })
        ));
    }
}

// vim: foldmethod=marker

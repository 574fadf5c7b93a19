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
use crate::control::{fields, ControlFile};
use crate::version::Version;
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// Maintenance script members a binary package may carry in its control
/// archive.
pub const SCRIPT_NAMES: &[&str] = &["preinst", "postinst", "prerm", "postrm", "validate"];

/// The kind of one entry of a package's data archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory, created idempotently on unpack.
    Directory,

    /// A symbolic link to `target`.
    Symlink {
        /// Link target, as stored.
        target: PathBuf,
    },

    /// Anything else (fifos, devices, ...). These are skipped with a
    /// warning on unpack.
    Other,
}

/// One decoded entry of a package's data archive.
#[derive(Clone, Debug)]
pub struct DataEntry {
    /// Path relative to the installation root.
    pub path: PathBuf,

    /// What kind of entry this is.
    pub kind: EntryKind,

    /// Unix permission bits.
    pub mode: u32,

    /// Owner name.
    pub owner: String,

    /// Group name.
    pub group: String,

    /// Size of the content, in bytes.
    pub size: u64,

    /// Modification time, seconds since the epoch.
    pub mtime: u64,

    /// The file content. Empty for anything that is not a regular file.
    pub content: Vec<u8>,
}

/// A fully decoded binary package.
///
/// The entire archive is held in memory: the control fields, the
/// maintenance scripts, and the data entries. Packages are expected to be
/// of reasonable size; holding the decoded form makes the unpack procedure
/// a plain loop over [DataEntry] values.
pub struct DebReader {
    control: ControlFile,
    name: String,
    version: Version,
    architecture: Architecture,
    conffiles: Vec<String>,
    scripts: BTreeMap<String, Vec<u8>>,
    data: Vec<DataEntry>,
}

fn decompress(member: &str, bytes: Vec<u8>) -> Result<Vec<u8>, Error> {
    if member.ends_with(".gz") {
        let mut out = vec![];
        GzDecoder::new(Cursor::new(bytes)).read_to_end(&mut out)?;
        Ok(out)
    } else if member.ends_with(".tar") {
        Ok(bytes)
    } else {
        Err(Error::UnsupportedCompression(member.to_owned()))
    }
}

/// Strip the `./` convention from an archive path and refuse anything that
/// would escape the extraction root.
fn safe_relative_path(path: &Path) -> Result<PathBuf, Error> {
    let mut ret = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => ret.push(part),
            Component::CurDir => {}
            _ => return Err(Error::UnsafePath(path.to_path_buf())),
        }
    }
    Ok(ret)
}

fn read_data_entries(data_tar: &[u8]) -> Result<Vec<DataEntry>, Error> {
    let mut ret = vec![];
    let mut archive = tar::Archive::new(Cursor::new(data_tar));
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = safe_relative_path(&entry.path()?.into_owned())?;
        if path.as_os_str().is_empty() {
            continue;
        }
        let header = entry.header();
        let kind = match header.entry_type() {
            tar::EntryType::Regular | tar::EntryType::Continuous => EntryKind::File,
            tar::EntryType::Directory => EntryKind::Directory,
            tar::EntryType::Symlink => match entry.link_name()? {
                Some(target) => EntryKind::Symlink {
                    target: target.into_owned(),
                },
                None => return Err(Error::UnsafePath(path)),
            },
            _ => EntryKind::Other,
        };
        let mode = header.mode().unwrap_or(0o644);
        let mtime = header.mtime().unwrap_or(0);
        let owner = match header.username() {
            Ok(Some(name)) if !name.is_empty() => name.to_owned(),
            _ => "root".to_owned(),
        };
        let group = match header.groupname() {
            Ok(Some(name)) if !name.is_empty() => name.to_owned(),
            _ => "root".to_owned(),
        };
        let mut content = vec![];
        if kind == EntryKind::File {
            entry.read_to_end(&mut content)?;
        }
        ret.push(DataEntry {
            path,
            kind,
            mode,
            owner,
            group,
            size: content.len() as u64,
            mtime,
            content,
        });
    }
    Ok(ret)
}

impl DebReader {
    /// Open and fully decode a binary package.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Decode a binary package from memory.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let mut control_tar: Option<Vec<u8>> = None;
        let mut data_tar: Option<Vec<u8>> = None;

        let mut archive = ar::Archive::new(Cursor::new(bytes));
        while let Some(entry) = archive.next_entry() {
            let mut entry = entry?;
            let member = String::from_utf8_lossy(entry.header().identifier()).to_string();
            let mut content = vec![];
            entry.read_to_end(&mut content)?;
            if member.starts_with("control.tar") {
                control_tar = Some(decompress(&member, content)?);
            } else if member.starts_with("data.tar") {
                data_tar = Some(decompress(&member, content)?);
            }
            // "debian-binary" and anything unknown is ignored
        }

        let control_tar = control_tar.ok_or(Error::MissingMember("control.tar"))?;
        let data_tar = data_tar.ok_or(Error::MissingMember("data.tar"))?;

        let mut members: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut control_archive = tar::Archive::new(Cursor::new(&control_tar[..]));
        for entry in control_archive.entries()? {
            let mut entry = entry?;
            if entry.header().entry_type() != tar::EntryType::Regular {
                continue;
            }
            let path = safe_relative_path(&entry.path()?.into_owned())?;
            let name = path.to_string_lossy().to_string();
            let mut content = vec![];
            entry.read_to_end(&mut content)?;
            members.insert(name, content);
        }

        let control_text = members
            .get("control")
            .ok_or(Error::MissingMember("control"))?;
        let control = ControlFile::parse(&String::from_utf8_lossy(control_text))?;

        let name = control
            .field(fields::PACKAGE)
            .ok_or(Error::MissingField(fields::PACKAGE))?
            .to_owned();
        let version = control
            .field(fields::VERSION)
            .ok_or(Error::MissingField(fields::VERSION))?
            .parse::<Version>()?;
        let architecture = control
            .field(fields::ARCHITECTURE)
            .ok_or(Error::MissingField(fields::ARCHITECTURE))?
            .parse::<Architecture>()?;

        let conffiles = match members.get("conffiles") {
            Some(content) => String::from_utf8_lossy(content)
                .lines()
                .map(|line| line.trim().to_owned())
                .filter(|line| !line.is_empty())
                .collect(),
            None => vec![],
        };

        let mut scripts = BTreeMap::new();
        for script in SCRIPT_NAMES {
            if let Some(content) = members.get(*script) {
                scripts.insert((*script).to_owned(), content.clone());
            }
        }

        Ok(DebReader {
            control,
            name,
            version,
            architecture,
            conffiles,
            scripts,
            data: read_data_entries(&data_tar)?,
        })
    }

    /// The control fields of the package.
    pub fn control(&self) -> &ControlFile {
        &self.control
    }

    /// The package name from the `Package` field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parsed `Version` field.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The parsed `Architecture` field.
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// The declared configuration files, as stored in the `conffiles`
    /// member.
    pub fn conffiles(&self) -> &[String] {
        &self.conffiles
    }

    /// Whether the given path (relative to the installation root, with or
    /// without a leading slash) is one of the package's conffiles.
    pub fn is_conffile(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.conffiles
            .iter()
            .any(|conffile| conffile.trim_start_matches('/') == path)
    }

    /// The maintenance scripts carried by the package.
    pub fn scripts(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.scripts
    }

    /// The decoded data archive entries, in archive order.
    pub fn data_entries(&self) -> &[DataEntry] {
        &self.data
    }
}

// vim: foldmethod=marker

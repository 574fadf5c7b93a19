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
use crate::archive::{DataEntry, EntryKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The kind of one indexed file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file.
    File,

    /// A directory.
    Directory,

    /// A symbolic link to `target`.
    Symlink {
        /// Link target, as stored.
        target: PathBuf,
    },
}

impl FileKind {
    fn as_str(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
            Self::Symlink { .. } => "link",
        }
    }
}

/// One entry of a package's file index: a file the package owns, with the
/// metadata it was installed with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the installation root.
    pub path: PathBuf,

    /// What kind of entry this is.
    pub kind: FileKind,

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
}

/// The file index of an installed package (`index.wpkgar`): every file the
/// package owns, one line per entry.
///
/// The on-disk format is a plain text line per entry:
///
/// ```text
/// file 644 root root 137 1650000000 usr/bin/foo
/// dir 755 root root 0 1650000000 usr/share/foo
/// link 777 root root 0 1650000000 usr/bin/foo-alias -> foo
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileIndex {
    /// The indexed entries, in unpack order.
    pub entries: Vec<FileEntry>,
}

impl FileIndex {
    /// Build an index from the decoded data archive of a package. Entries
    /// of unsupported kinds are not indexed (they are not unpacked
    /// either).
    pub fn from_data_entries(entries: &[DataEntry]) -> Self {
        FileIndex {
            entries: entries
                .iter()
                .filter_map(|entry| {
                    let kind = match &entry.kind {
                        EntryKind::File => FileKind::File,
                        EntryKind::Directory => FileKind::Directory,
                        EntryKind::Symlink { target } => FileKind::Symlink {
                            target: target.clone(),
                        },
                        EntryKind::Other => return None,
                    };
                    Some(FileEntry {
                        path: entry.path.clone(),
                        kind,
                        mode: entry.mode,
                        owner: entry.owner.clone(),
                        group: entry.group.clone(),
                        size: entry.size,
                        mtime: entry.mtime,
                    })
                })
                .collect(),
        }
    }

    /// Look up the entry owning `path`.
    pub fn entry(&self, path: &Path) -> Option<&FileEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    /// Whether `path` is owned by this index.
    pub fn contains(&self, path: &Path) -> bool {
        self.entry(path).is_some()
    }

    /// Iterate over the non-directory paths of the index.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.kind != FileKind::Directory)
    }
}

impl FromStr for FileIndex {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        let mut entries = vec![];
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let bad = || Error::InvalidFileIndex(line.to_owned());
            let mut tokens = line.splitn(7, ' ');
            let kind = tokens.next().ok_or_else(bad)?;
            let mode = u32::from_str_radix(tokens.next().ok_or_else(bad)?, 8)
                .map_err(|_| bad())?;
            let owner = tokens.next().ok_or_else(bad)?.to_owned();
            let group = tokens.next().ok_or_else(bad)?.to_owned();
            let size = tokens
                .next()
                .ok_or_else(bad)?
                .parse::<u64>()
                .map_err(|_| bad())?;
            let mtime = tokens
                .next()
                .ok_or_else(bad)?
                .parse::<u64>()
                .map_err(|_| bad())?;
            let rest = tokens.next().ok_or_else(bad)?;
            let (path, kind) = match kind {
                "file" => (rest, FileKind::File),
                "dir" => (rest, FileKind::Directory),
                "link" => {
                    let (path, target) = rest.rsplit_once(" -> ").ok_or_else(bad)?;
                    (
                        path,
                        FileKind::Symlink {
                            target: PathBuf::from(target),
                        },
                    )
                }
                _ => return Err(bad()),
            };
            entries.push(FileEntry {
                path: PathBuf::from(path),
                kind,
                mode,
                owner,
                group,
                size,
                mtime,
            });
        }
        Ok(FileIndex { entries })
    }
}

impl std::fmt::Display for FileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            write!(
                f,
                "{} {:o} {} {} {} {} {}",
                entry.kind.as_str(),
                entry.mode,
                entry.owner,
                entry.group,
                entry.size,
                entry.mtime,
                entry.path.display()
            )?;
            if let FileKind::Symlink { target } = &entry.kind {
                write!(f, " -> {}", target.display())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let index = FileIndex {
            entries: vec![
                FileEntry {
                    path: PathBuf::from("usr/bin/foo"),
                    kind: FileKind::File,
                    mode: 0o755,
                    owner: "root".to_owned(),
                    group: "root".to_owned(),
                    size: 137,
                    mtime: 1650000000,
                },
                FileEntry {
                    path: PathBuf::from("usr/share/foo bar"),
                    kind: FileKind::Directory,
                    mode: 0o755,
                    owner: "root".to_owned(),
                    group: "root".to_owned(),
                    size: 0,
                    mtime: 1650000000,
                },
                FileEntry {
                    path: PathBuf::from("usr/bin/foo-alias"),
                    kind: FileKind::Symlink {
                        target: PathBuf::from("foo"),
                    },
                    mode: 0o777,
                    owner: "root".to_owned(),
                    group: "root".to_owned(),
                    size: 0,
                    mtime: 1650000000,
                },
            ],
        };
        let parsed: FileIndex = index.to_string().parse().unwrap();
        assert_eq!(index, parsed);
    }

    #[test]
    fn lookup() {
        let index: FileIndex = "file 644 root root 3 0 etc/foo.conf\n".parse().unwrap();
        assert!(index.contains(Path::new("etc/foo.conf")));
        assert!(!index.contains(Path::new("etc/bar.conf")));
        assert_eq!(1, index.files().count());
    }

    #[test]
    fn bad_lines_are_rejected() {
        assert!("file 644 root root usr/bin/foo\n".parse::<FileIndex>().is_err());
        assert!("pipe 644 root root 0 0 dev/foo\n".parse::<FileIndex>().is_err());
    }
}

// vim: foldmethod=marker

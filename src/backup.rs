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

//! The `backup` module implements the scoped backup vault every
//! destructive per-package procedure owns.
//!
//! Before a file is overwritten or deleted, the procedure calls
//! [BackupVault::backup] on it. If the procedure completes it calls
//! [BackupVault::commit]; when the vault goes out of scope it then only
//! deletes its backup slots. On any other exit path -- an error return, a
//! failing maintenance script, a cancellation -- the vault restores every
//! touched path to its previous content (or removes it again if it did
//! not exist) before deleting the slots.

use crate::database::{self, Database, Error};
use crate::output::Level;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
enum Saved {
    /// The path did not exist: restoring means deleting it.
    Absent,

    /// The path was a regular file, copied into the given backup slot.
    File(PathBuf),

    /// The path was a symbolic link to the given target.
    Symlink(PathBuf),
}

/// A scoped backup of the files one destructive procedure mutates.
pub struct BackupVault<'db> {
    db: &'db Database,
    package: String,
    action: String,
    files: BTreeMap<PathBuf, Saved>,
    count: u32,
    committed: bool,
}

impl<'db> BackupVault<'db> {
    /// Open a vault for one procedure. `package` and `action` tag the
    /// diagnostics the vault emits.
    pub fn new(db: &'db Database, package: &str, action: &str) -> Self {
        BackupVault {
            db,
            package: package.to_owned(),
            action: action.to_owned(),
            files: BTreeMap::new(),
            count: 0,
            committed: false,
        }
    }

    /// Record the current state of `path` so it can be restored.
    ///
    /// An existing file is copied into a slot under the database's backup
    /// directory; a missing file is recorded as "absent" so a restore can
    /// delete whatever appeared there. Returns false when the path was
    /// already backed up by this vault.
    pub fn backup(&mut self, path: &Path) -> Result<bool, Error> {
        if self.files.contains_key(path) {
            return Ok(false);
        }
        let saved = match std::fs::symlink_metadata(path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Saved::Absent,
            Err(err) => return Err(Error::Io(path.to_path_buf(), err)),
            Ok(metadata) if metadata.file_type().is_symlink() => {
                let target = std::fs::read_link(path).map_err(database::io_ctx(path))?;
                Saved::Symlink(target)
            }
            Ok(_) => {
                let dir = self.db.backup_dir();
                std::fs::create_dir_all(&dir).map_err(database::io_ctx(&dir))?;
                self.count += 1;
                let slot = dir.join(format!("file{}.bak", self.count));
                std::fs::copy(path, &slot).map_err(database::io_ctx(&slot))?;
                Saved::File(slot)
            }
        };
        self.files.insert(path.to_path_buf(), saved);
        Ok(true)
    }

    /// Declare the procedure successful: the slots will simply be deleted
    /// and the on-disk state stands.
    pub fn commit(&mut self) {
        self.committed = true;
    }

    fn restore(&mut self) {
        for (path, saved) in &self.files {
            let result = match saved {
                Saved::Absent => match std::fs::remove_file(path) {
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    other => other,
                },
                Saved::File(slot) => {
                    // the current occupant may be a symlink; copying
                    // through it would miss the point
                    let _ = std::fs::remove_file(path);
                    std::fs::copy(slot, path).map(|_| ())
                }
                Saved::Symlink(target) => {
                    let _ = std::fs::remove_file(path);
                    restore_symlink(target, path)
                }
            };
            if let Err(err) = result {
                self.db.output().log(
                    Level::Error,
                    "backup",
                    Some(&self.package),
                    &self.action,
                    format!("could not restore {:?}: {}", path, err),
                );
            }
        }
        self.files.clear();
    }

    fn delete_slots(&mut self) {
        for saved in self.files.values() {
            if let Saved::File(slot) = saved {
                let _ = std::fs::remove_file(slot);
            }
        }
    }
}

impl Drop for BackupVault<'_> {
    /// Destruction without [BackupVault::commit] restores; either way the
    /// backup slots are removed and nothing here ever panics.
    fn drop(&mut self) {
        if !self.committed {
            let slots = self
                .files
                .values()
                .filter_map(|saved| match saved {
                    Saved::File(slot) => Some(slot.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>();
            self.restore();
            for slot in slots {
                let _ = std::fs::remove_file(slot);
            }
        } else {
            self.delete_slots();
        }
    }
}

#[cfg(unix)]
fn restore_symlink(target: &Path, path: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, path)
}

#[cfg(not(unix))]
fn restore_symlink(_target: &Path, _path: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::architecture::Architecture;

    fn new_db(root: &Path) -> Database {
        let arch: Architecture = "linux-amd64".parse().unwrap();
        Database::create(root, &arch).unwrap();
        Database::open(root).unwrap()
    }

    #[test]
    fn restore_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));
        let kept = dir.path().join("kept.txt");
        let gone = dir.path().join("gone.txt");
        std::fs::write(&kept, b"original").unwrap();

        {
            let mut vault = BackupVault::new(&db, "tool", "unpack");
            assert!(vault.backup(&kept).unwrap());
            assert!(!vault.backup(&kept).unwrap());
            assert!(vault.backup(&gone).unwrap());
            std::fs::write(&kept, b"overwritten").unwrap();
            std::fs::write(&gone, b"created").unwrap();
            // no commit: dropping restores
        }

        assert_eq!(b"original".to_vec(), std::fs::read(&kept).unwrap());
        assert!(!gone.exists());
        assert_eq!(0, std::fs::read_dir(db.backup_dir()).unwrap().count());
    }

    #[test]
    fn commit_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"original").unwrap();

        {
            let mut vault = BackupVault::new(&db, "tool", "unpack");
            vault.backup(&file).unwrap();
            std::fs::write(&file, b"overwritten").unwrap();
            vault.commit();
        }

        assert_eq!(b"overwritten".to_vec(), std::fs::read(&file).unwrap());
        assert_eq!(0, std::fs::read_dir(db.backup_dir()).unwrap().count());
    }

    #[cfg(unix)]
    #[test]
    fn restore_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("somewhere", &link).unwrap();

        {
            let mut vault = BackupVault::new(&db, "tool", "unpack");
            vault.backup(&link).unwrap();
            std::fs::remove_file(&link).unwrap();
            std::fs::write(&link, b"a file now").unwrap();
        }

        assert_eq!(
            PathBuf::from("somewhere"),
            std::fs::read_link(&link).unwrap()
        );
    }
}

// vim: foldmethod=marker

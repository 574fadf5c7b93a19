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

//! The size and overwrite validation step: every file the plan will write
//! is checked against the other plan items, the installed packages'
//! file indexes, and the current content of the file system.

use super::item::PackageType;
use super::{Error, Force, Installer};
use crate::archive::EntryKind;
use crate::control::fields;
use crate::output::Level;
use std::collections::BTreeMap;
use std::path::PathBuf;

impl Installer<'_> {
    /// Step 16 of the pipeline.
    ///
    /// Checked per file: (a) no two plan items own the same non-directory
    /// path; (b) an existing on-disk path may only be overwritten by the
    /// package that owns it (its upgrade) or under the overwrite force;
    /// (c) files owned by an essential package are never overwritten,
    /// regardless of forces; (d) replacing a directory with a
    /// non-directory (or the other way around) needs the stricter
    /// overwrite-dir force.
    pub(super) fn validate_size_and_overwrite(&mut self) -> Result<(), Error> {
        // who owns what, per the installed file indexes
        let mut owners: BTreeMap<PathBuf, String> = BTreeMap::new();
        for item in &self.packages {
            if !matches!(
                item.item_type(),
                PackageType::Installed | PackageType::Unpacked
            ) {
                continue;
            }
            let index = self.db.file_index(item.name())?;
            for entry in index.files() {
                owners.insert(entry.path.clone(), item.name().to_owned());
            }
        }

        let mut planned: BTreeMap<PathBuf, String> = BTreeMap::new();
        let mut installed_size: u64 = 0;

        for idx in 0..self.packages.len() {
            if !self.packages[idx].item_type().is_to_install() {
                continue;
            }
            self.db.check_interrupt()?;
            let name = self.packages[idx].name().to_owned();
            if let Some(size) = self.packages[idx].field(fields::INSTALLED_SIZE) {
                installed_size += size.trim().parse::<u64>().unwrap_or(0);
            }
            let reader = match self.packages[idx].reader() {
                Ok(reader) => reader,
                Err(err) => {
                    self.log(
                        Level::Error,
                        Some(&name),
                        "validate-overwrite",
                        format!("package {:?} cannot be loaded: {}", name, err),
                    );
                    continue;
                }
            };

            for entry in reader.data_entries() {
                let target = match self.db.install_target(&entry.path) {
                    Ok(target) => target,
                    Err(err) => {
                        self.log(
                            Level::Error,
                            Some(&name),
                            "validate-overwrite",
                            format!(
                                "package {:?} would write outside the target: {}",
                                name, err
                            ),
                        );
                        continue;
                    }
                };
                let on_disk = std::fs::symlink_metadata(&target).ok();

                if entry.kind == EntryKind::Directory {
                    if let Some(metadata) = &on_disk {
                        if !metadata.is_dir() {
                            self.report(
                                Force::OverwriteDir,
                                Some(&name),
                                "validate-overwrite",
                                format!(
                                    "package {:?} needs {:?} to be a directory but a file is in the way",
                                    name, target
                                ),
                            );
                        }
                    }
                    continue;
                }
                if entry.kind == EntryKind::Other {
                    continue;
                }

                // (a) two plan items owning one path
                if let Some(other) = planned.get(&entry.path) {
                    if other != &name {
                        self.log(
                            Level::Error,
                            Some(&name),
                            "validate-overwrite",
                            format!(
                                "packages {:?} and {:?} both want to install {:?}",
                                other, name, entry.path
                            ),
                        );
                        continue;
                    }
                }
                planned.insert(entry.path.clone(), name.clone());

                let Some(metadata) = on_disk else {
                    continue;
                };

                // (d) a directory in the way of a file
                if metadata.is_dir() {
                    self.report(
                        Force::OverwriteDir,
                        Some(&name),
                        "validate-overwrite",
                        format!(
                            "package {:?} wants to install file {:?} over a directory",
                            name, target
                        ),
                    );
                    continue;
                }

                match owners.get(&entry.path) {
                    Some(owner) if owner == &name => {
                        // the package overwrites its own file (an
                        // upgrade); that is the normal case
                    }
                    Some(owner) => {
                        // (c) essential owners win unconditionally
                        if self.db.get_boolean_field(owner, fields::ESSENTIAL)? {
                            self.log(
                                Level::Error,
                                Some(&name),
                                "validate-overwrite",
                                format!(
                                    "package {:?} would overwrite {:?} owned by essential package {:?}; this cannot be forced",
                                    name, entry.path, owner
                                ),
                            );
                        } else {
                            self.report(
                                Force::Overwrite,
                                Some(&name),
                                "validate-overwrite",
                                format!(
                                    "package {:?} would overwrite {:?} owned by package {:?}",
                                    name, entry.path, owner
                                ),
                            );
                        }
                    }
                    None => {
                        self.report(
                            Force::Overwrite,
                            Some(&name),
                            "validate-overwrite",
                            format!(
                                "package {:?} would overwrite the existing unowned file {:?}",
                                name, target
                            ),
                        );
                    }
                }
            }
        }

        self.log(
            Level::Info,
            None,
            "validate-size",
            format!(
                "the plan installs approximately {} kB over {} file(s)",
                installed_size,
                planned.len()
            ),
        );
        Ok(())
    }
}

// vim: foldmethod=marker

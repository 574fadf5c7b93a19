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

//! The execution half of the installer: unpack, configure, pre-configure
//! and reconfigure procedures, with the maintenance-script recovery paths
//! and the conffile preservation logic.

use super::item::PackageType;
use super::validate::set_executable;
use super::{Error, Force, Installer, Mode, Step};
use crate::archive::{DebReader, EntryKind};
use crate::backup::BackupVault;
use crate::control::fields;
use crate::database::{rfc2822_now, FileIndex, PackageStatus, ScriptKind};
use crate::output::Level;
use crate::tracker::quote_arg;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut ret = path.as_os_str().to_owned();
    ret.push(suffix);
    PathBuf::from(ret)
}

#[cfg(all(unix, target_os = "linux"))]
fn process_is_root() -> bool {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata("/proc/self")
        .map(|metadata| metadata.uid() == 0)
        .unwrap_or(false)
}

#[cfg(not(all(unix, target_os = "linux")))]
fn process_is_root() -> bool {
    false
}

impl Installer<'_> {
    /// Unpack the next item of the plan. Returns the index of the item
    /// that was unpacked (pass it to [Installer::configure]) or
    /// [Step::EndOfPlan] once the plan is exhausted.
    pub fn unpack(&mut self) -> Result<Step, Error> {
        self.require_validated()?;
        if matches!(self.mode, Mode::Configuring | Mode::Reconfiguring) {
            return Err(Error::WrongMode("unpack"));
        }

        while self.plan_position < self.plan.len() {
            let idx = self.plan[self.plan_position];
            let item = &self.packages[idx];
            if !item.item_type().is_to_install() || item.is_unpacked() {
                self.plan_position += 1;
                continue;
            }

            let name = item.name().to_owned();
            self.log(
                Level::Info,
                Some(&name),
                "unpack",
                format!("unpacking {} {}", name, item.version()),
            );

            // the inverse instruction goes to the journal before anything
            // is touched
            match item.upgrade() {
                None => {
                    self.db.track(&format!("purge {}", name), &name)?;
                }
                Some(old_idx) => {
                    let old = &self.packages[old_idx];
                    let old_deb = format!(
                        "{}_{}_{}.deb",
                        old.name(),
                        old.version().to_filename_string(),
                        old.architecture()
                    );
                    self.db
                        .track(&format!("downgrade {}", quote_arg(&old_deb)), &name)?;
                }
            }

            self.do_unpack(idx)?;
            self.packages[idx].mark_unpacked();
            self.plan_position += 1;
            return Ok(Step::Item(idx));
        }
        Ok(Step::EndOfPlan)
    }

    /// Run a maintenance script carried by an archive that has no (or an
    /// outdated) database record, through a temporary file.
    fn run_archive_script(
        &self,
        reader: &DebReader,
        package: &str,
        script: &str,
        args: &[&str],
    ) -> Result<bool, Error> {
        let Some(content) = reader.scripts().get(script) else {
            return Ok(true);
        };
        let path = self.db.tmp_dir().join(format!("{}-{}", script, package));
        std::fs::write(&path, content).map_err(|err| Error::Io(path.clone(), err))?;
        set_executable(&path)?;
        let ok = self.db.run_script_file(&path, package, args)?;
        let _ = std::fs::remove_file(&path);
        Ok(ok)
    }

    fn do_unpack(&self, idx: usize) -> Result<(), Error> {
        let item = &self.packages[idx];
        let name = item.name().to_owned();
        let new_version = item.version().to_string();
        let reader = item.reader()?;
        let upgrading = item.upgrade().is_some();
        let original_status = self.db.package_status(&name)?;
        let previous_version = self.db.get_field(&name, fields::VERSION)?;

        // upgrades first give the installed package a chance to veto
        if upgrading && original_status == PackageStatus::Installed {
            self.db.set_package_status(&name, PackageStatus::HalfInstalled)?;
            if !self
                .db
                .run_script(&name, ScriptKind::Prerm, &["upgrade", &new_version])?
            {
                let old_version = previous_version.clone().unwrap_or_default();
                if !self.run_archive_script(
                    &reader,
                    &name,
                    "prerm",
                    &["failed-upgrade", &old_version],
                )? {
                    // both prerm attempts failed; ask the old postinst to
                    // put things back
                    if self.db.run_script(
                        &name,
                        ScriptKind::Postinst,
                        &["abort-upgrade", &new_version],
                    )? {
                        self.db.set_package_status(&name, original_status)?;
                    }
                    return Err(Error::ScriptFailed {
                        package: name,
                        action: "prerm upgrade".to_owned(),
                    });
                }
            }
        }

        if upgrading {
            if original_status != PackageStatus::Installed {
                self.db.set_package_status(&name, PackageStatus::HalfInstalled)?;
            }
            // keep the old checksums around so configure can tell
            // pristine conffiles from modified ones
            self.db.rotate_md5sums(&name)?;
        } else {
            self.db.create_package_record(&reader, item.archive())?;
            self.db.set_package_status(&name, PackageStatus::HalfInstalled)?;
        }

        // preinst of the new package
        let preinst_args: Vec<&str> = if upgrading {
            vec!["upgrade", previous_version.as_deref().unwrap_or_default()]
        } else {
            match (&original_status, &previous_version) {
                (PackageStatus::ConfigFiles, Some(previous)) => vec!["install", previous.as_str()],
                _ => vec!["install"],
            }
        };
        let preinst_ok = if upgrading {
            self.run_archive_script(&reader, &name, "preinst", &preinst_args)?
        } else {
            self.db
                .run_script(&name, ScriptKind::Preinst, &preinst_args)?
        };
        if !preinst_ok {
            if upgrading {
                self.run_archive_script(
                    &reader,
                    &name,
                    "postrm",
                    &["abort-upgrade", previous_version.as_deref().unwrap_or_default()],
                )?;
                self.db.set_package_status(&name, original_status)?;
            } else {
                self.db
                    .run_script(&name, ScriptKind::Postrm, &["abort-install"])?;
                match original_status {
                    PackageStatus::ConfigFiles => {
                        self.db
                            .set_package_status(&name, PackageStatus::ConfigFiles)?;
                    }
                    _ => {
                        self.db.remove_package_record(&name)?;
                    }
                }
            }
            return Err(Error::ScriptFailed {
                package: name,
                action: "preinst".to_owned(),
            });
        }

        // extract the data archive under the protection of the vault
        let mut vault = BackupVault::new(self.db, &name, "unpack");
        for entry in reader.data_entries() {
            self.db.check_interrupt()?;
            let target = self.db.install_target(&entry.path)?;
            match &entry.kind {
                EntryKind::File => {
                    let path_str = entry.path.display().to_string();
                    let target = if reader.is_conffile(&path_str) {
                        suffixed(&target, ".wpkg-new")
                    } else {
                        target
                    };
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)
                            .map_err(|err| Error::Io(parent.to_path_buf(), err))?;
                    }
                    vault.backup(&target)?;
                    std::fs::write(&target, &entry.content)
                        .map_err(|err| Error::Io(target.clone(), err))?;
                    self.apply_file_info(&name, &target, entry.mode, entry.mtime)?;
                }
                EntryKind::Directory => {
                    std::fs::create_dir_all(&target)
                        .map_err(|err| Error::Io(target.clone(), err))?;
                    self.apply_file_info(&name, &target, entry.mode, entry.mtime)?;
                }
                EntryKind::Symlink { target: link } => {
                    vault.backup(&target)?;
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)
                            .map_err(|err| Error::Io(parent.to_path_buf(), err))?;
                    }
                    let _ = std::fs::remove_file(&target);
                    make_symlink(link, &target)?;
                }
                EntryKind::Other => {
                    self.log(
                        Level::Warning,
                        Some(&name),
                        "unpack",
                        format!(
                            "{:?} is neither a regular file, a directory nor a symbolic link; skipped",
                            entry.path
                        ),
                    );
                }
            }
        }

        // files the old version owned and the new one does not are
        // deleted (except conffiles)
        if upgrading {
            let old_index = self.db.file_index(&name)?;
            for old_entry in old_index.files() {
                self.db.check_interrupt()?;
                let still_owned = reader
                    .data_entries()
                    .iter()
                    .any(|entry| entry.path == old_entry.path);
                if still_owned {
                    continue;
                }
                let path_str = old_entry.path.display().to_string();
                if self.db.is_conffile(&name, &path_str)? {
                    continue;
                }
                let target = self.db.install_target(&old_entry.path)?;
                vault.backup(&target)?;
                if let Err(err) = std::fs::remove_file(&target) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        if self.force(Force::FileInfo) {
                            if !self.force(Force::QuietFileInfo) {
                                self.log(
                                    Level::Warning,
                                    Some(&name),
                                    "unpack",
                                    format!("obsolete file {:?} could not be deleted: {}", target, err),
                                );
                            }
                        } else {
                            self.log(
                                Level::Error,
                                Some(&name),
                                "unpack",
                                format!("obsolete file {:?} could not be deleted: {}", target, err),
                            );
                            return Err(Error::Io(target, err));
                        }
                    }
                }
            }

            // the old version gets its parting words
            if !self
                .db
                .run_script(&name, ScriptKind::Postrm, &["upgrade", &new_version])?
            {
                self.log(
                    Level::Warning,
                    Some(&name),
                    "unpack",
                    "the old postrm upgrade script failed; continuing".to_owned(),
                );
            }
            if !self
                .db
                .run_global_hooks(ScriptKind::Postrm, &["upgrade", &name, &new_version])?
            {
                self.log(
                    Level::Warning,
                    Some(&name),
                    "unpack",
                    "a global postrm upgrade hook failed; continuing".to_owned(),
                );
            }

            // only now may the record flip to the new version; the old
            // scripts are not needed anymore
            self.db.create_package_record(&reader, item.archive())?;
        }

        self.db
            .install_file_index(&name, &FileIndex::from_data_entries(reader.data_entries()))?;
        let explicit = matches!(
            item.item_type(),
            PackageType::Explicit | PackageType::Upgrade | PackageType::Downgrade
        );
        self.db
            .set_field(&name, fields::X_EXPLICIT, if explicit { "yes" } else { "no" })?;
        self.db.set_package_status(&name, PackageStatus::Unpacked)?;

        vault.commit();
        Ok(())
    }

    fn apply_file_info(
        &self,
        package: &str,
        target: &Path,
        mode: u32,
        mtime: u64,
    ) -> Result<(), Error> {
        if let Err(err) = set_mode(target, mode) {
            if self.force(Force::FileInfo) {
                if !self.force(Force::QuietFileInfo) {
                    self.log(
                        Level::Warning,
                        Some(package),
                        "unpack",
                        format!("mode of {:?} could not be set: {}", target, err),
                    );
                }
            } else {
                self.log(
                    Level::Error,
                    Some(package),
                    "unpack",
                    format!("mode of {:?} could not be set: {}", target, err),
                );
                return Err(Error::Io(target.to_path_buf(), err));
            }
        }
        // ownership can only be applied when running as root
        if process_is_root() {
            if let Err(err) = set_owner_root(target) {
                if self.force(Force::FileInfo) {
                    if !self.force(Force::QuietFileInfo) {
                        self.log(
                            Level::Warning,
                            Some(package),
                            "unpack",
                            format!("owner of {:?} could not be set: {}", target, err),
                        );
                    }
                } else {
                    self.log(
                        Level::Error,
                        Some(package),
                        "unpack",
                        format!("owner of {:?} could not be set: {}", target, err),
                    );
                    return Err(Error::Io(target.to_path_buf(), err));
                }
            }
        }
        // timestamps are informational; a failure here is not worth a
        // diagnostic
        if let Ok(file) = std::fs::File::options().write(true).open(target) {
            let _ = file.set_modified(
                std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(mtime),
            );
        }
        Ok(())
    }

    /// Configure the item at `idx` (which must have been unpacked, either
    /// by this session or -- in configure mode -- by an earlier one).
    /// Items that are not part of the plan are skipped silently so a
    /// caller may sweep every index.
    pub fn configure(&mut self, idx: usize) -> Result<(), Error> {
        self.require_validated()?;
        let item = self.package(idx)?;
        match item.item_type() {
            PackageType::Configure => {}
            t if t.is_to_install() => {
                if !item.is_unpacked() {
                    return Err(Error::NotUnpacked(item.name().to_owned()));
                }
                if item.is_configured() {
                    return Ok(());
                }
            }
            _ => return Ok(()),
        }
        let name = item.name().to_owned();
        self.db.track(&format!("deconfigure {}", name), &name)?;
        self.configure_package(&name)?;
        self.packages[idx].mark_configured();
        Ok(())
    }

    /// The configure procedure proper, driven entirely by the database
    /// record: resolve the conffiles, run `postinst configure`, mark the
    /// package `Installed`.
    pub(super) fn configure_package(&self, name: &str) -> Result<(), Error> {
        let version = self
            .db
            .get_field(name, fields::VERSION)?
            .unwrap_or_default();
        self.log(
            Level::Info,
            Some(name),
            "configure",
            format!("configuring {} {}", name, version),
        );
        self.db
            .set_package_status(name, PackageStatus::HalfConfigured)?;

        // conffile resolution: a pristine file is replaced by the new
        // version, a user-modified one is left alone with the new file
        // next to it
        let mut pristine_sums = self.db.previous_md5sums(name)?;
        if pristine_sums.is_empty() {
            pristine_sums = self.db.md5sums(name)?;
        }
        for conffile in self.db.conffiles(name)? {
            self.db.check_interrupt()?;
            let relative = conffile.trim_start_matches('/');
            let target = self.db.install_target(Path::new(relative))?;
            let new = suffixed(&target, ".wpkg-new");
            if !target.exists() {
                if new.exists() {
                    std::fs::rename(&new, &target)
                        .map_err(|err| Error::Io(target.clone(), err))?;
                }
                continue;
            }
            if !new.exists() {
                continue;
            }
            let content =
                std::fs::read(&target).map_err(|err| Error::Io(target.clone(), err))?;
            let disk_sum = hex::encode(Md5::digest(&content));
            if pristine_sums.get(relative).map(|sum| sum == &disk_sum) == Some(true) {
                // pristine: the new version of the file takes over, the
                // old one is kept aside
                let old = suffixed(&target, ".wpkg-old");
                let _ = std::fs::remove_file(&old);
                std::fs::rename(&target, &old).map_err(|err| Error::Io(old.clone(), err))?;
                std::fs::rename(&new, &target)
                    .map_err(|err| Error::Io(target.clone(), err))?;
            } else {
                self.log(
                    Level::Info,
                    Some(name),
                    "configure",
                    format!(
                        "{:?} was modified; the new version is installed as {:?}",
                        target, new
                    ),
                );
            }
        }

        if !self
            .db
            .run_script(name, ScriptKind::Postinst, &["configure", &version])?
        {
            return Err(Error::ScriptFailed {
                package: name.to_owned(),
                action: "postinst configure".to_owned(),
            });
        }
        if !self
            .db
            .run_global_hooks(ScriptKind::Postinst, &["configure", name, &version])?
        {
            self.log(
                Level::Warning,
                Some(name),
                "configure",
                "a global postinst configure hook failed; continuing".to_owned(),
            );
        }

        self.db.set_package_status(name, PackageStatus::Installed)?;
        self.db.drop_previous_md5sums(name)?;
        self.db
            .set_field(name, fields::X_INSTALL_DATE, &rfc2822_now())?;
        Ok(())
    }

    /// Configure every package that is sitting in state `Unpacked` in the
    /// database and that the plan depends on, before any unpack happens.
    pub fn pre_configure(&mut self) -> Result<(), Error> {
        self.require_validated()?;
        if matches!(self.mode, Mode::Configuring | Mode::Reconfiguring) {
            return Ok(());
        }
        for name in self.db.list_installed_packages()? {
            self.db.check_interrupt()?;
            if self.db.package_status(&name)? != PackageStatus::Unpacked {
                continue;
            }
            // a package the plan replaces is not configured first
            if self
                .find_item_by_name(&name, |item| item.item_type().is_to_install())
                .is_some()
            {
                continue;
            }
            if !self.plan_depends_on(&name)? {
                continue;
            }
            self.db.track(&format!("deconfigure {}", name), &name)?;
            self.configure_package(&name)?;
        }
        Ok(())
    }

    fn plan_depends_on(&self, name: &str) -> Result<bool, Error> {
        for &idx in &self.plan {
            if let Some(dependency) = self.packages[idx].dependency_field(fields::DEPENDS)? {
                for relation in &dependency.relations {
                    if relation
                        .possibilities
                        .iter()
                        .any(|possibility| possibility.name == name)
                    {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Reconfigure the next operand: re-extract its conffiles from the
    /// archive it was installed from (as `.wpkg-new`, so the standard
    /// conffile resolution applies) and run the configure procedure.
    pub fn reconfigure(&mut self) -> Result<Step, Error> {
        self.require_validated()?;
        if self.mode != Mode::Reconfiguring {
            return Err(Error::WrongMode("reconfigure"));
        }

        while self.plan_position < self.plan.len() {
            let idx = self.plan[self.plan_position];
            self.plan_position += 1;
            let item = &self.packages[idx];
            if item.item_type() != PackageType::Configure || item.is_configured() {
                continue;
            }
            let name = item.name().to_owned();

            let Some(archive) = self.db.get_field(&name, fields::X_ARCHIVE_FILENAME)? else {
                self.log(
                    Level::Error,
                    Some(&name),
                    "reconfigure",
                    format!(
                        "the archive package {:?} was installed from is not known; cannot reconfigure",
                        name
                    ),
                );
                return Err(Error::NoArchive(name));
            };
            let archive = PathBuf::from(archive);
            let reader = DebReader::open(&archive)?;

            let mut vault = BackupVault::new(self.db, &name, "reconfigure");
            for entry in reader.data_entries() {
                if entry.kind != EntryKind::File {
                    continue;
                }
                let path_str = entry.path.display().to_string();
                if !reader.is_conffile(&path_str) {
                    continue;
                }
                let target = suffixed(&self.db.install_target(&entry.path)?, ".wpkg-new");
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|err| Error::Io(parent.to_path_buf(), err))?;
                }
                vault.backup(&target)?;
                std::fs::write(&target, &entry.content)
                    .map_err(|err| Error::Io(target.clone(), err))?;
            }
            vault.commit();

            self.db.track(&format!("configure {}", name), &name)?;
            self.configure_package(&name)?;
            self.packages[idx].mark_configured();
            return Ok(Step::Item(idx));
        }
        Ok(Step::EndOfPlan)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_owner_root(path: &Path) -> std::io::Result<()> {
    std::os::unix::fs::chown(path, Some(0), Some(0))
}

#[cfg(not(unix))]
fn set_owner_root(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn make_symlink(link: &Path, target: &Path) -> Result<(), Error> {
    std::os::unix::fs::symlink(link, target).map_err(|err| Error::Io(target.to_path_buf(), err))
}

#[cfg(not(unix))]
fn make_symlink(_link: &Path, target: &Path) -> Result<(), Error> {
    Err(Error::Io(
        target.to_path_buf(),
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symbolic links are not supported on this platform",
        ),
    ))
}

// vim: foldmethod=marker

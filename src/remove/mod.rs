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

//! The `remove` module plans and executes package removals.
//!
//! A [Remover] session resolves the operand names against the installed
//! set, refuses what may not go away (`required` packages
//! unconditionally, essential and held packages unless forced), scans the
//! reverse dependencies of everything being removed, and then steps
//! through the removal: files first ([Remover::remove], conffiles
//! excepted), configuration afterwards ([Remover::deconfigure], which
//! also implements purging). [Remover::autoremove] sweeps out
//! automatically installed packages nothing depends on anymore.

mod item;


pub use item::{RemoveItem, RemoveType};

use crate::backup::BackupVault;
use crate::control::fields;
use crate::database::{rfc2822_now, Database, PackageStatus, ScriptKind, Selection};
use crate::dependency::is_package_name;
use crate::install::Step;
use crate::output::Level;
use crate::tracker::quote_arg;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Force flags of the removal session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Force {
    /// Remove even when installed packages depend on the operands.
    Depends,

    /// Remove packages whose selection is `hold`.
    Hold,

    /// Remove essential packages. Nothing removes `required` packages.
    RemoveEssentials,

    /// Recursively remove the packages depending on the operands instead
    /// of failing.
    Recursive,
}

/// Error conditions which may be encountered planning or executing a
/// removal.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Validation recorded this many error-level events; the plan is not
    /// usable.
    ValidationFailed(u64),

    /// An execution entry point was called before a successful
    /// [Remover::validate].
    NotValidated,

    /// An index passed to [Remover::deconfigure] is out of range.
    InvalidIndex(usize),

    /// [Remover::deconfigure] was called on a package whose files were
    /// not removed yet (and the session is not a deconfiguration).
    NotRemoved(String),

    /// A maintenance script failed and its recovery path was taken.
    ScriptFailed {
        /// Package whose script failed.
        package: String,
        /// The script and verb that failed.
        action: String,
    },

    /// A file operation failed.
    Io(PathBuf, std::io::Error),

    /// Database layer failure.
    Database(crate::database::Error),

    /// Dependency expression failure.
    Dependency(crate::dependency::Error),
}
crate::errors::error_enum!(Error);

impl From<crate::database::Error> for Error {
    fn from(err: crate::database::Error) -> Self {
        Error::Database(err)
    }
}

impl From<crate::dependency::Error> for Error {
    fn from(err: crate::dependency::Error) -> Self {
        Error::Dependency(err)
    }
}

// dependency fields that keep a package from being autoremoved or that a
// removal can break
const DEPEND_FIELDS: &[&str] = &[
    fields::DEPENDS,
    fields::PRE_DEPENDS,
    fields::BUILD_DEPENDS,
    fields::BUILD_DEPENDS_ARCH,
    fields::BUILD_DEPENDS_INDEP,
    fields::BUILT_USING,
];

/// A removal session over one open [Database].
pub struct Remover<'db> {
    db: &'db Database,
    purging: bool,
    deconfiguring: bool,
    forces: BTreeSet<Force>,
    inputs: Vec<String>,
    packages: Vec<RemoveItem>,
    validated: bool,
    position: usize,
}

impl<'db> Remover<'db> {
    /// Open a removal session.
    pub fn new(db: &'db Database) -> Self {
        Remover {
            db,
            purging: false,
            deconfiguring: false,
            forces: BTreeSet::new(),
            inputs: vec![],
            packages: vec![],
            validated: false,
            position: 0,
        }
    }

    /// Also purge: configuration files are deleted too.
    pub fn set_purging(&mut self) {
        self.purging = true;
    }

    /// Whether the session purges.
    pub fn get_purging(&self) -> bool {
        self.purging
    }

    /// Deconfigure only: the files stay, the configuration is renamed
    /// aside.
    pub fn set_deconfiguring(&mut self) {
        self.deconfiguring = true;
    }

    /// Whether the session deconfigures only.
    pub fn get_deconfiguring(&self) -> bool {
        self.deconfiguring
    }

    /// Set or clear a force flag.
    pub fn set_force(&mut self, force: Force, enabled: bool) {
        if enabled {
            self.forces.insert(force);
        } else {
            self.forces.remove(&force);
        }
    }

    /// Whether a force flag is set.
    pub fn force(&self, force: Force) -> bool {
        self.forces.contains(&force)
    }

    /// Register an operand. Removal works on installed package names
    /// only; archive references are rejected during validation.
    pub fn add_package(&mut self, package: &str) {
        self.inputs.push(package.to_owned());
    }

    /// Number of items the session knows about (only meaningful after
    /// [Remover::validate]).
    pub fn count(&self) -> usize {
        self.packages.len()
    }

    /// Name of the item at `idx`.
    pub fn package_name(&self, idx: usize) -> Result<&str, Error> {
        self.packages
            .get(idx)
            .map(|item| item.name())
            .ok_or(Error::InvalidIndex(idx))
    }

    /// The item at `idx`.
    pub fn package(&self, idx: usize) -> Result<&RemoveItem, Error> {
        self.packages.get(idx).ok_or(Error::InvalidIndex(idx))
    }

    fn log(&self, level: Level, package: Option<&str>, action: &str, message: String) {
        self.db
            .output()
            .log(level, "remove", package, action, message);
    }

    fn report(&self, force: Force, package: Option<&str>, action: &str, message: String) {
        let level = if self.force(force) {
            Level::Warning
        } else {
            Level::Error
        };
        self.log(level, package, action, message);
    }

    // ------------------------------------------------------------------
    // validation

    /// Build and check the removal plan. Problems are recorded through
    /// the session output; the call fails if any error remains.
    pub fn validate(&mut self) -> Result<(), Error> {
        let start = self.db.output().error_count();
        self.resolve_inputs()?;
        self.load_other_installed()?;
        self.check_removability()?;
        self.scan_reverse_dependencies()?;
        self.validate_scripts()?;
        let errors = self.db.output().error_count() - start;
        if errors > 0 {
            return Err(Error::ValidationFailed(errors));
        }
        self.validated = true;
        Ok(())
    }

    /// Resolve each operand name against the installed set and classify
    /// it.
    fn resolve_inputs(&mut self) -> Result<(), Error> {
        for input in std::mem::take(&mut self.inputs) {
            self.db.check_interrupt()?;
            if input.contains('/') || input.ends_with(".deb") || !is_package_name(&input) {
                self.log(
                    Level::Error,
                    None,
                    "validate-removal",
                    format!(
                        "{:?} is not an installed package name; removal works on names only",
                        input
                    ),
                );
                continue;
            }
            if self.packages.iter().any(|item| item.name() == input) {
                self.log(
                    Level::Error,
                    Some(&input),
                    "validate-removal",
                    format!("package {:?} was specified more than once", input),
                );
                continue;
            }
            let status = self.db.package_status(&input)?;
            let item_type = match status {
                PackageStatus::Installed | PackageStatus::Unpacked | PackageStatus::Removing => {
                    RemoveType::Removing
                }
                PackageStatus::HalfInstalled | PackageStatus::HalfConfigured => {
                    // removal doubles as the repair
                    RemoveType::Removing
                }
                PackageStatus::ConfigFiles | PackageStatus::Purging => {
                    if self.purging || self.deconfiguring {
                        RemoveType::Removing
                    } else {
                        self.log(
                            Level::Warning,
                            Some(&input),
                            "validate-removal",
                            format!(
                                "package {:?} has no installed files left; nothing to remove",
                                input
                            ),
                        );
                        RemoveType::Same
                    }
                }
                PackageStatus::NotInstalled => {
                    self.log(
                        Level::Error,
                        Some(&input),
                        "validate-removal",
                        format!("package {:?} is not installed", input),
                    );
                    continue;
                }
            };
            let version = self
                .db
                .get_field(&input, fields::VERSION)?
                .unwrap_or_default();
            let architecture = self
                .db
                .get_field(&input, fields::ARCHITECTURE)?
                .unwrap_or_default();
            self.packages.push(RemoveItem::new(
                &input,
                version,
                architecture,
                item_type,
                status,
            ));
        }
        Ok(())
    }

    /// Load the remaining installed packages so the reverse-dependency
    /// scan can see them.
    fn load_other_installed(&mut self) -> Result<(), Error> {
        for name in self.db.list_installed_packages()? {
            self.db.check_interrupt()?;
            if self.packages.iter().any(|item| item.name() == name) {
                continue;
            }
            let status = self.db.package_status(&name)?;
            let item_type = match status {
                PackageStatus::Installed => RemoveType::Installed,
                PackageStatus::Unpacked => RemoveType::Unpacked,
                PackageStatus::ConfigFiles => RemoveType::ConfigFiles,
                PackageStatus::NotInstalled => continue,
                _ => RemoveType::NeedRepair,
            };
            let version = self
                .db
                .get_field(&name, fields::VERSION)?
                .unwrap_or_default();
            let architecture = self
                .db
                .get_field(&name, fields::ARCHITECTURE)?
                .unwrap_or_default();
            self.packages.push(RemoveItem::new(
                &name,
                version,
                architecture,
                item_type,
                status,
            ));
        }
        Ok(())
    }

    /// Whether a single package may be removed at all: `required`
    /// packages never, essential and held ones only under their force.
    /// `cannot_force` is set for packages pulled in implicitly, where
    /// the administrator did not name the package and the forces do not
    /// speak for it.
    fn can_package_be_removed(&self, name: &str, cannot_force: bool) -> Result<bool, Error> {
        if let Some(priority) = self.db.get_field(name, fields::PRIORITY)? {
            if priority.eq_ignore_ascii_case("required") {
                self.log(
                    Level::Error,
                    Some(name),
                    "validate-removal",
                    format!(
                        "package {:?} is required and cannot be removed, purged, or deconfigured; no force exists for this",
                        name
                    ),
                );
                return Ok(false);
            }
        }
        if self.db.get_boolean_field(name, fields::ESSENTIAL)? {
            if !cannot_force && self.force(Force::RemoveEssentials) {
                self.log(
                    Level::Warning,
                    Some(name),
                    "validate-removal",
                    format!("essential package {:?} is going to be removed", name),
                );
            } else {
                self.log(
                    Level::Error,
                    Some(name),
                    "validate-removal",
                    format!(
                        "package {:?} is essential and will not be removed, purged, or deconfigured",
                        name
                    ),
                );
                return Ok(false);
            }
        }
        if self.db.selection(name)? == Selection::Hold {
            if !cannot_force && self.force(Force::Hold) {
                self.log(
                    Level::Warning,
                    Some(name),
                    "validate-removal",
                    format!("package {:?} is removed even though it is on hold", name),
                );
            } else {
                self.log(
                    Level::Error,
                    Some(name),
                    "validate-removal",
                    format!("package {:?} is on hold and will not be removed", name),
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn check_removability(&mut self) -> Result<(), Error> {
        for idx in 0..self.packages.len() {
            if self.packages[idx].item_type() != RemoveType::Removing {
                continue;
            }
            let name = self.packages[idx].name().to_owned();
            if !self.can_package_be_removed(&name, false)? {
                self.packages[idx].set_type(RemoveType::Invalid);
            }
        }
        Ok(())
    }

    /// For every installed package that depends on something being
    /// removed: recursively mark it for removal (recursive force), ignore
    /// the breakage (depends force), or fail.
    fn scan_reverse_dependencies(&mut self) -> Result<(), Error> {
        loop {
            self.db.check_interrupt()?;
            let removing: BTreeSet<String> = self
                .packages
                .iter()
                .filter(|item| item.item_type().is_to_remove())
                .map(|item| item.name().to_owned())
                .collect();
            if removing.is_empty() {
                return Ok(());
            }

            let mut newly_implicit = vec![];
            for idx in 0..self.packages.len() {
                let item = &self.packages[idx];
                if !matches!(
                    item.item_type(),
                    RemoveType::Installed | RemoveType::Unpacked | RemoveType::NeedRepair
                ) {
                    continue;
                }
                let name = item.name().to_owned();
                let Some(broken) = self.depends_on_any(&name, &removing)? else {
                    continue;
                };
                if self.force(Force::Recursive) {
                    newly_implicit.push((idx, name, broken));
                } else if self.force(Force::Depends) {
                    self.log(
                        Level::Warning,
                        Some(&name),
                        "validate-removal",
                        format!(
                            "package {:?} depends on {:?} which is being removed",
                            name, broken
                        ),
                    );
                } else {
                    self.log(
                        Level::Error,
                        Some(&name),
                        "validate-removal",
                        format!(
                            "removing {:?} would break package {:?} which depends on it",
                            broken, name
                        ),
                    );
                }
            }

            if newly_implicit.is_empty() {
                return Ok(());
            }
            for (idx, name, broken) in newly_implicit {
                self.log(
                    Level::Info,
                    Some(&name),
                    "validate-removal",
                    format!(
                        "package {:?} depends on {:?} and is removed along with it",
                        name, broken
                    ),
                );
                // implicit removals cannot lean on the essential or hold
                // forces; the administrator did not name them
                if self.can_package_be_removed(&name, true)? {
                    self.packages[idx].set_type(RemoveType::Implicit);
                } else {
                    self.packages[idx].set_type(RemoveType::Invalid);
                }
            }
            // the new implicit removals may break further packages
        }
    }

    /// The first name of `removing` the named package depends on, if
    /// any.
    fn depends_on_any(
        &self,
        name: &str,
        removing: &BTreeSet<String>,
    ) -> Result<Option<String>, Error> {
        for field in DEPEND_FIELDS {
            let Some(value) = self.db.get_field(name, field)? else {
                continue;
            };
            let dependency: crate::dependency::Dependency = value.parse()?;
            for relation in &dependency.relations {
                // an alternative only breaks when every possibility is
                // going away or absent
                let mut hit = None;
                let mut survives = false;
                for possibility in &relation.possibilities {
                    if removing.contains(&possibility.name) {
                        hit = Some(possibility.name.clone());
                    } else if self
                        .packages
                        .iter()
                        .any(|item| {
                            item.name() == possibility.name
                                && matches!(
                                    item.item_type(),
                                    RemoveType::Installed | RemoveType::Unpacked
                                )
                        })
                    {
                        survives = true;
                    }
                }
                if let Some(hit) = hit {
                    if !survives {
                        return Ok(Some(hit));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Run the `validate` scripts of the packages being removed plus the
    /// global validate hooks; any refusal is fatal.
    fn validate_scripts(&mut self) -> Result<(), Error> {
        for idx in 0..self.packages.len() {
            if !self.packages[idx].item_type().is_to_remove() {
                continue;
            }
            let name = self.packages[idx].name().to_owned();
            let version = self.packages[idx].version().to_owned();
            if self.db.has_script(&name, ScriptKind::Validate)? {
                if !self.db.run_script(&name, ScriptKind::Validate, &[])? {
                    self.log(
                        Level::Fatal,
                        Some(&name),
                        "validate-scripts",
                        format!("the validate script of package {:?} refused the removal", name),
                    );
                    continue;
                }
            }
            if !self.db.run_global_hooks(
                ScriptKind::Validate,
                &["validate", name.as_str(), version.as_str()],
            )? {
                self.log(
                    Level::Fatal,
                    Some(&name),
                    "validate-scripts",
                    format!("a global validate hook refused the removal of {:?}", name),
                );
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // execution

    /// Remove the files of the next package of the plan. Returns the
    /// index of the item (pass it to [Remover::deconfigure] when
    /// purging) or [Step::EndOfPlan].
    pub fn remove(&mut self) -> Result<Step, Error> {
        if !self.validated {
            return Err(Error::NotValidated);
        }
        while self.position < self.packages.len() {
            let idx = self.position;
            self.position += 1;
            let item = &self.packages[idx];
            if !item.item_type().is_to_remove() || item.is_removed() {
                continue;
            }
            let name = item.name().to_owned();
            self.log(
                Level::Info,
                Some(&name),
                "remove",
                format!("removing {}", name),
            );

            // restoring a configured package needs a full install; one
            // that was only unpacked needs an unpack
            let verb = if item.was_configured() {
                "install"
            } else {
                "unpack"
            };
            let filename_version = item
                .version()
                .parse::<crate::version::Version>()
                .map(|v| v.to_filename_string())
                .unwrap_or_else(|_| item.version().to_owned());
            let mut filename = format!("{}_{}", name, filename_version);
            if !item.architecture().is_empty()
                && item.architecture() != "src"
                && item.architecture() != "source"
            {
                filename.push('_');
                filename.push_str(item.architecture());
            }
            filename.push_str(".deb");
            self.db
                .track(&format!("{} {}", verb, quote_arg(&filename)), &name)?;

            self.do_remove(idx)?;
            self.packages[idx].mark_removed();
            // deconfigure decides between its purge and deconfigure
            // flavors off the status the removal left behind
            let status = self.db.package_status(&name)?;
            self.packages[idx].reset_original_status(status);
            return Ok(Step::Item(idx));
        }
        Ok(Step::EndOfPlan)
    }

    /// Run the prerm (or its deconfigure flavor) with its documented
    /// recovery path. Returns false when the removal must be canceled.
    fn prerm_scripts(&self, idx: usize, command: &str) -> Result<bool, Error> {
        let item = &self.packages[idx];
        let name = item.name().to_owned();
        let version = item.version().to_owned();
        let status = self.db.package_status(&name)?;
        let new_status = match status {
            PackageStatus::Installed | PackageStatus::Unpacked => PackageStatus::HalfInstalled,
            PackageStatus::ConfigFiles => PackageStatus::HalfConfigured,
            _ => {
                // it was never properly installed; no scripts to run and
                // no state worth changing
                return Ok(true);
            }
        };
        self.db.set_package_status(&name, new_status)?;

        if !self.db.run_global_hooks(
            ScriptKind::Prerm,
            &[command, name.as_str(), version.as_str()],
        )? {
            self.log(
                Level::Error,
                Some(&name),
                "remove-scripts",
                format!("a global prerm hook failed for package {:?}; canceled", name),
            );
            return Ok(false);
        }

        if !self.db.run_script(&name, ScriptKind::Prerm, &[command])? {
            self.log(
                Level::Warning,
                Some(&name),
                "remove-scripts",
                format!("the prerm script of package {:?} failed; canceled", name),
            );
            let abort = format!("abort-{}", command);
            if self
                .db
                .run_script(&name, ScriptKind::Postinst, &[abort.as_str()])?
            {
                self.db.set_package_status(&name, status)?;
            } else {
                self.log(
                    Level::Warning,
                    Some(&name),
                    "remove-scripts",
                    format!(
                        "the postinst script failed to restore package {:?}; it is now half-installed or half-configured",
                        name
                    ),
                );
            }
            return Ok(false);
        }
        Ok(true)
    }

    fn do_remove(&self, idx: usize) -> Result<(), Error> {
        if !self.prerm_scripts(idx, "remove")? {
            return Err(Error::ScriptFailed {
                package: self.packages[idx].name().to_owned(),
                action: "prerm remove".to_owned(),
            });
        }
        let item = &self.packages[idx];
        let name = item.name().to_owned();
        let version = item.version().to_owned();

        let mut vault = BackupVault::new(self.db, &name, "remove");
        self.db.set_package_status(&name, PackageStatus::Removing)?;
        self.db
            .set_field(&name, fields::X_REMOVE_DATE, &rfc2822_now())?;

        let result = self.remove_files(&name, &mut vault);
        if result.is_err() {
            self.db
                .set_package_status(&name, PackageStatus::HalfInstalled)?;
            // dpkg does not do this, but letting the package try to
            // clean up seems only logical
            self.db
                .run_script(&name, ScriptKind::Postinst, &["abort-remove"])?;
            return result;
        }

        self.db
            .set_package_status(&name, PackageStatus::HalfInstalled)?;
        if !self.db.run_script(&name, ScriptKind::Postrm, &["remove"])? {
            self.log(
                Level::Warning,
                Some(&name),
                "remove",
                format!("the postrm script of package {:?} failed; ignored", name),
            );
        }
        if !self.db.run_global_hooks(
            ScriptKind::Postrm,
            &["remove", name.as_str(), version.as_str()],
        )? {
            self.log(
                Level::Warning,
                Some(&name),
                "remove",
                format!("a global postrm hook failed for package {:?}; ignored", name),
            );
        }

        self.db.remove_hooks(&name)?;

        // configuration files survive a plain removal
        let final_status = match item.original_status() {
            PackageStatus::Unpacked | PackageStatus::NotInstalled => PackageStatus::NotInstalled,
            _ => PackageStatus::ConfigFiles,
        };
        self.db.set_package_status(&name, final_status)?;
        self.db
            .set_field(&name, fields::X_REMOVED_DATE, &rfc2822_now())?;

        vault.commit();
        Ok(())
    }

    fn remove_files(&self, name: &str, vault: &mut BackupVault<'_>) -> Result<(), Error> {
        let index = self.db.file_index(name)?;
        for entry in index.files() {
            self.db.check_interrupt()?;
            let path = entry.path.display().to_string();
            if self.db.is_conffile(name, &path)? {
                continue;
            }
            let target = self.db.install_target(&entry.path)?;
            vault.backup(&target)?;
            match std::fs::remove_file(&target) {
                Ok(()) => {
                    self.log(
                        Level::Debug,
                        Some(name),
                        "remove-delete",
                        format!("{:?} removed", target),
                    );
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::Io(target, err)),
            }
        }
        // directories are left behind on purpose; other packages may
        // still own files in them
        Ok(())
    }

    /// Deconfigure (or purge) the item at `idx`. For a plain removal this
    /// runs after [Remover::remove] returned the index; in deconfigure
    /// mode it is the only step.
    pub fn deconfigure(&mut self, idx: usize) -> Result<(), Error> {
        if !self.validated {
            return Err(Error::NotValidated);
        }
        let item = self.package(idx)?;
        match item.item_type() {
            RemoveType::Removing | RemoveType::Implicit => {
                if !self.deconfiguring && !item.is_removed() {
                    return Err(Error::NotRemoved(item.name().to_owned()));
                }
            }
            // ignored: these are either already gone or merely loaded as
            // context for the reverse-dependency scan
            _ => return Ok(()),
        }
        let name = item.name().to_owned();
        self.log(
            Level::Info,
            Some(&name),
            "deconfigure",
            format!("deconfiguring {}", name),
        );
        if self.deconfiguring {
            // a plain deconfigure is undone by configuring again; for a
            // removal the restore instruction was already recorded
            self.db.track(&format!("configure {}", name), &name)?;
        }
        self.deconfigure_package(idx)
    }

    fn deconfigure_package(&self, idx: usize) -> Result<(), Error> {
        let item = &self.packages[idx];
        let name = item.name().to_owned();
        let version = item.version().to_owned();

        // deconfiguring a package that keeps its files renames the
        // configuration aside; purging deletes it
        let keep_files = item.original_status() == PackageStatus::Installed && !self.purging
            || self.deconfiguring && !self.purging;
        let command = if keep_files { "deconfigure" } else { "purge" };

        if !self.prerm_scripts(idx, command)? {
            return Err(Error::ScriptFailed {
                package: name,
                action: format!("prerm {}", command),
            });
        }

        let working_status = if keep_files {
            PackageStatus::HalfConfigured
        } else {
            PackageStatus::Purging
        };
        self.db.set_package_status(&name, working_status)?;
        self.db
            .set_field(&name, fields::X_DECONFIGURE_DATE, &rfc2822_now())?;

        for conffile in self.db.conffiles(&name)? {
            self.db.check_interrupt()?;
            let relative = conffile.trim_start_matches('/');
            let target = self.db.install_target(Path::new(relative))?;
            if keep_files {
                // save the user's configuration rather than deleting it
                let user = suffixed(&target, ".wpkg-user");
                let _ = std::fs::remove_file(&user);
                if target.exists() {
                    std::fs::rename(&target, &user)
                        .map_err(|err| Error::Io(user.clone(), err))?;
                } else {
                    self.log(
                        Level::Info,
                        Some(&name),
                        "remove-deconfigure",
                        format!("no configuration file {:?}, it probably was deleted", target),
                    );
                }
            } else {
                for path in [
                    target.clone(),
                    suffixed(&target, ".wpkg-new"),
                    suffixed(&target, ".wpkg-old"),
                ] {
                    match std::fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                        Err(err) => return Err(Error::Io(path, err)),
                    }
                }
            }
        }

        let final_status = if keep_files {
            PackageStatus::Unpacked
        } else {
            PackageStatus::NotInstalled
        };
        self.db.set_package_status(&name, final_status)?;

        if !self
            .db
            .run_script(&name, ScriptKind::Postrm, &[command])?
        {
            self.log(
                Level::Warning,
                Some(&name),
                "remove-deconfigure",
                format!("the postrm script of package {:?} failed while deconfiguring", name),
            );
        }
        if !self.db.run_global_hooks(
            ScriptKind::Postrm,
            &[command, name.as_str(), version.as_str()],
        )? {
            self.log(
                Level::Warning,
                Some(&name),
                "remove-deconfigure",
                format!("a global postrm hook failed for package {:?} while deconfiguring", name),
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // autoremove

    /// Remove every package whose selection is `auto` (or that was only
    /// ever installed implicitly) and that no remaining installed package
    /// depends on, repeating until a fixed point. Essential and
    /// `required` packages are never autoremoved. Returns the names that
    /// were (or, on a dry run, would be) removed, in removal order.
    pub fn autoremove(&mut self, dry_run: bool) -> Result<Vec<String>, Error> {
        let mut statuses = std::collections::BTreeMap::new();
        for name in self.db.list_installed_packages()? {
            self.db.check_interrupt()?;
            statuses.insert(name.clone(), self.db.package_status(&name)?);
        }

        let mut removed = vec![];
        let mut repeat = true;
        while repeat {
            repeat = false;
            let names: Vec<String> = statuses.keys().cloned().collect();
            for name in names {
                self.db.check_interrupt()?;
                let mut removable = match statuses[&name] {
                    PackageStatus::ConfigFiles => self.purging,
                    PackageStatus::Installed | PackageStatus::Unpacked => {
                        !self.db.get_boolean_field(&name, fields::ESSENTIAL)?
                            && !self
                                .db
                                .get_field(&name, fields::PRIORITY)?
                                .map(|priority| priority.eq_ignore_ascii_case("required"))
                                .unwrap_or(false)
                    }
                    _ => false,
                };

                // only packages recorded as automatically installed
                // qualify
                if removable {
                    removable = if self.db.field_is_defined(&name, fields::X_SELECTION)? {
                        self.db.selection(&name)? == Selection::Auto
                    } else if self.db.field_is_defined(&name, fields::X_EXPLICIT)? {
                        !self.db.get_boolean_field(&name, fields::X_EXPLICIT)?
                    } else {
                        false
                    };
                }

                // a package something still depends on stays; packages
                // that are down to their configuration files hold no
                // dependencies up
                if removable && statuses[&name] != PackageStatus::ConfigFiles {
                    for (other, status) in &statuses {
                        if other == &name
                            || !matches!(
                                status,
                                PackageStatus::Installed
                                    | PackageStatus::Unpacked
                                    | PackageStatus::HalfInstalled
                                    | PackageStatus::HalfConfigured
                            )
                        {
                            continue;
                        }
                        if self.package_depends_on(other, &name)? {
                            removable = false;
                            break;
                        }
                    }
                }

                if !removable {
                    continue;
                }

                repeat = true;
                self.log(
                    Level::Info,
                    Some(&name),
                    "autoremove",
                    format!("auto-removing package {:?}", name),
                );
                removed.push(name.clone());

                if !dry_run {
                    let mut remover = Remover::new(self.db);
                    if self.purging {
                        remover.set_purging();
                    }
                    remover.add_package(&name);
                    if let Err(err) = remover.validate() {
                        self.log(
                            Level::Error,
                            Some(&name),
                            "autoremove",
                            format!("package {:?} cannot be auto-removed: {}", name, err),
                        );
                        return Err(err);
                    }
                    match remover.remove()? {
                        Step::Item(idx) => {
                            if self.purging {
                                remover.deconfigure(idx)?;
                            }
                        }
                        Step::EndOfPlan => {}
                    }
                }
                statuses.insert(name, PackageStatus::NotInstalled);
            }
        }
        Ok(removed)
    }

    /// Whether `name` names `dependency` in one of its dependency
    /// fields. Autoremove is conservative: an alternative keeps its
    /// members alive.
    fn package_depends_on(&self, name: &str, dependency: &str) -> Result<bool, Error> {
        for field in DEPEND_FIELDS {
            let Some(value) = self.db.get_field(name, field)? else {
                continue;
            };
            let parsed: crate::dependency::Dependency = value.parse()?;
            for relation in &parsed.relations {
                if relation
                    .possibilities
                    .iter()
                    .any(|possibility| possibility.name == dependency)
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut ret = path.as_os_str().to_owned();
    ret.push(suffix);
    PathBuf::from(ret)
}

// vim: foldmethod=marker

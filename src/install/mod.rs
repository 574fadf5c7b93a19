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

//! The `install` module plans and executes package installations.
//!
//! An [Installer] session declares a mode (installing, unpacking,
//! configuring or reconfiguring), registers operand packages, and calls
//! [Installer::validate] to build the plan. Validation walks a long
//! pipeline -- directory expansion, architecture checks, pre-dependencies,
//! dependency resolution against the installed set and the configured
//! repositories, conflict trimming, tree enumeration over version
//! alternatives, overwrite checks, maintenance-script validation -- and
//! finally sorts the plan topologically so every dependency is unpacked
//! before its dependents.
//!
//! Execution then alternates [Installer::unpack] (one plan item per call)
//! and [Installer::configure], with [Installer::pre_configure] run once
//! up front to configure already-unpacked packages the plan depends on.
//! Every destructive step records its inverse instruction in the attached
//! rollback journal first, and mutates files under a
//! [crate::backup::BackupVault] so a failing step restores what it
//! touched.
//!
//! Most validation problems are recorded through the session's
//! [crate::output::Output] and demoted to warnings by the matching
//! [Force] flag; [Installer::validate] fails if any error-level event was
//! recorded.

mod disk;
mod item;
mod tree;
mod unpack;
mod validate;

#[cfg(test)]
pub(crate) mod tests;

pub use item::{PackageItem, PackageType};

use crate::architecture::Architecture;
use crate::database::Database;
use crate::output::Level;
use crate::version::Version;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What a session does with its operand packages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Unpack and configure.
    Installing,

    /// Unpack only; configuration happens in a later session.
    Unpacking,

    /// Configure packages previously unpacked.
    Configuring,

    /// Re-extract conffiles and configure again.
    Reconfiguring,
}

/// Force flags, each demoting one class of validation error to a warning
/// (or enabling a behavior that is refused by default).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Force {
    /// Install packages whose architecture does not match the target.
    Architecture,

    /// Install packages that break installed packages.
    Breaks,

    /// Let a pre-dependency be satisfied by a package that is only
    /// unpacked, configuring it on the fly.
    ConfigureAny,

    /// Install packages that conflict with installed packages. Conflicts
    /// between two explicit packages are never demoted.
    Conflicts,

    /// Install despite missing dependencies.
    Depends,

    /// Install despite version-incompatible dependencies.
    DependsVersion,

    /// Install packages whose distribution does not match the target's.
    Distribution,

    /// Replace an installed package with an older version.
    Downgrade,

    /// Demote chmod/chown and post-upgrade deletion failures to warnings.
    FileInfo,

    /// Upgrade or downgrade packages whose selection is `hold`.
    Hold,

    /// Overwrite files owned by another installed package. Files owned
    /// by an essential package are never overwritten.
    Overwrite,

    /// Replace a directory with a file or a symlink (or the reverse).
    OverwriteDir,

    /// Replay the rollback journal automatically when execution fails.
    Rollback,

    /// Upgrade from a version older than the package's declared
    /// `Minimum-Upgradable-Version`.
    UpgradeAnyVersion,

    /// Ignore the vendor tuple position when matching architectures.
    Vendor,

    /// Do not warn about chmod/chown failures (implies they are
    /// tolerated).
    QuietFileInfo,

    /// Expand directory operands recursively, and scan repository
    /// sub-directories.
    Recursive,

    /// Silently skip packages whose exact version is already installed.
    SkipSameVersion,
}

/// Result of one execution step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// One item was processed; its index can be passed to
    /// [Installer::configure].
    Item(usize),

    /// The plan is exhausted.
    EndOfPlan,
}

/// One row of the observable plan, as returned by
/// [Installer::install_list].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallListEntry {
    /// Package name.
    pub name: String,

    /// Version that will be installed.
    pub version: Version,

    /// Whether the administrator asked for this package (true) or the
    /// planner pulled it in (false).
    pub explicit: bool,

    /// Whether an installed instance is being replaced.
    pub is_upgrade: bool,
}

/// Error conditions which may be encountered planning or executing an
/// installation.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Validation recorded this many error-level events; the plan is not
    /// usable.
    ValidationFailed(u64),

    /// An execution entry point was called before a successful
    /// [Installer::validate].
    NotValidated,

    /// The entry point does not match the session mode.
    WrongMode(&'static str),

    /// An index passed to [Installer::configure] is out of range.
    InvalidIndex(usize),

    /// A directory operand expanded to no archives at all.
    EmptyDirectory(PathBuf),

    /// An item has no archive to load its file data from.
    NoArchive(String),

    /// [Installer::configure] was called on an item that was not
    /// unpacked yet.
    NotUnpacked(String),

    /// A required control field is missing.
    MissingField(&'static str),

    /// A control field failed to parse; carries the underlying error.
    BadField {
        /// Package the field belongs to.
        package: String,
        /// Field name.
        field: String,
        /// What went wrong.
        error: Box<Error>,
    },

    /// A maintenance script failed and its recovery path was taken.
    ScriptFailed {
        /// Package whose script failed.
        package: String,
        /// The script and verb that failed.
        action: String,
    },

    /// A file operation failed during unpack.
    Io(PathBuf, std::io::Error),

    /// Database layer failure.
    Database(crate::database::Error),

    /// Archive layer failure.
    Archive(crate::archive::Error),

    /// Repository layer failure.
    Repository(crate::repository::Error),

    /// Dependency expression failure.
    Dependency(crate::dependency::Error),

    /// Version parse failure.
    Version(crate::version::Error),

    /// Architecture parse failure.
    Architecture(crate::architecture::Error),

    /// Field validation expression failure.
    Expression(crate::control::expression::Error),

    /// Control file failure.
    Control(crate::control::Error),
}
crate::errors::error_enum!(Error);

impl From<crate::database::Error> for Error {
    fn from(err: crate::database::Error) -> Self {
        Error::Database(err)
    }
}

impl From<crate::archive::Error> for Error {
    fn from(err: crate::archive::Error) -> Self {
        Error::Archive(err)
    }
}

impl From<crate::repository::Error> for Error {
    fn from(err: crate::repository::Error) -> Self {
        Error::Repository(err)
    }
}

impl From<crate::dependency::Error> for Error {
    fn from(err: crate::dependency::Error) -> Self {
        Error::Dependency(err)
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

impl From<crate::control::expression::Error> for Error {
    fn from(err: crate::control::expression::Error) -> Self {
        Error::Expression(err)
    }
}

impl From<crate::control::Error> for Error {
    fn from(err: crate::control::Error) -> Self {
        Error::Control(err)
    }
}

/// An installation session over one open [Database].
pub struct Installer<'db> {
    db: &'db Database,
    mode: Mode,
    forces: BTreeSet<Force>,
    inputs: Vec<String>,
    field_validations: Vec<String>,
    repositories: Vec<PathBuf>,
    packages: Vec<PackageItem>,
    plan: Vec<usize>,
    plan_position: usize,
    validated: bool,
    install_source: bool,
    repositories_loaded: bool,
    target: Option<Architecture>,
}

impl<'db> Installer<'db> {
    /// Open an installation session. The mode defaults to installing.
    pub fn new(db: &'db Database) -> Self {
        Installer {
            db,
            mode: Mode::Installing,
            forces: BTreeSet::new(),
            inputs: vec![],
            field_validations: vec![],
            repositories: vec![],
            packages: vec![],
            plan: vec![],
            plan_position: 0,
            validated: false,
            install_source: false,
            repositories_loaded: false,
            target: None,
        }
    }

    /// Unpack and configure the operand packages.
    pub fn set_installing(&mut self) {
        self.mode = Mode::Installing;
    }

    /// Unpack the operand packages without configuring them.
    pub fn set_unpacking(&mut self) {
        self.mode = Mode::Unpacking;
    }

    /// Configure already-unpacked packages; operands are package names.
    pub fn set_configuring(&mut self) {
        self.mode = Mode::Configuring;
    }

    /// Re-extract conffiles of installed packages and configure them
    /// again; operands are package names.
    pub fn set_reconfiguring(&mut self) {
        self.mode = Mode::Reconfiguring;
    }

    /// The session mode.
    pub fn mode(&self) -> Mode {
        self.mode
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

    /// Register an operand: an archive path, a directory of archives, or
    /// a bare package name to look up in the repositories.
    pub fn add_package(&mut self, package: &str) {
        self.inputs.push(package.to_owned());
    }

    /// Register an additional repository directory, on top of the ones
    /// configured in the target's `sources.list`.
    pub fn add_repository(&mut self, repository: &Path) {
        self.repositories.push(repository.to_path_buf());
    }

    /// Require a field validation expression of every explicit package.
    pub fn add_field_validation(&mut self, expression: &str) {
        self.field_validations.push(expression.to_owned());
    }

    /// Number of items the session knows about (only meaningful after
    /// [Installer::validate]).
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
    pub fn package(&self, idx: usize) -> Result<&PackageItem, Error> {
        self.packages.get(idx).ok_or(Error::InvalidIndex(idx))
    }

    /// The observable plan: every package that will be acted on, with its
    /// version, whether it was explicitly requested, and whether it is an
    /// upgrade.
    pub fn install_list(&self) -> Vec<InstallListEntry> {
        self.plan
            .iter()
            .map(|&idx| {
                let item = &self.packages[idx];
                InstallListEntry {
                    name: item.name().to_owned(),
                    version: item.version().clone(),
                    explicit: matches!(
                        item.item_type(),
                        PackageType::Explicit | PackageType::Upgrade | PackageType::Downgrade
                    ),
                    is_upgrade: item.upgrade().is_some(),
                }
            })
            .collect()
    }

    /// Build and check the plan. Most steps record problems through the
    /// session output and keep scanning; the call fails if any error
    /// remains at the end.
    pub fn validate(&mut self) -> Result<(), Error> {
        let start_errors = self.db.output().error_count();
        self.target = Some(self.db.architecture()?);
        match self.mode {
            Mode::Installing | Mode::Unpacking => self.validate_installation()?,
            Mode::Configuring | Mode::Reconfiguring => self.validate_configuration()?,
        }
        let errors = self.db.output().error_count() - start_errors;
        if errors > 0 {
            return Err(Error::ValidationFailed(errors));
        }
        self.validated = true;
        Ok(())
    }

    /// Dispatch one step appropriate for the session mode: an unpack, or
    /// a reconfigure.
    pub fn step(&mut self) -> Result<Step, Error> {
        match self.mode {
            Mode::Reconfiguring => self.reconfigure(),
            _ => self.unpack(),
        }
    }

    // ------------------------------------------------------------------
    // internal helpers shared by the pipeline files

    pub(super) fn target_arch(&self) -> &Architecture {
        self.target
            .as_ref()
            .expect("target architecture is set at the start of validate()")
    }

    pub(super) fn log(
        &self,
        level: Level,
        package: Option<&str>,
        action: &str,
        message: String,
    ) {
        self.db
            .output()
            .log(level, "install", package, action, message);
    }

    /// Record a problem as a warning when `force` is set, as an error
    /// otherwise.
    pub(super) fn report(&self, force: Force, package: Option<&str>, action: &str, message: String) {
        let level = if self.force(force) {
            Level::Warning
        } else {
            Level::Error
        };
        self.log(level, package, action, message);
    }

    pub(super) fn find_item_by_name(
        &self,
        name: &str,
        filter: impl Fn(&PackageItem) -> bool,
    ) -> Option<usize> {
        self.packages
            .iter()
            .position(|item| item.name() == name && filter(item))
    }

    pub(super) fn require_validated(&self) -> Result<(), Error> {
        if !self.validated {
            return Err(Error::NotValidated);
        }
        Ok(())
    }
}

// vim: foldmethod=marker

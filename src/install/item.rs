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
use crate::control::{expression, fields, ControlFile};
use crate::database::PackageStatus;
use crate::dependency::Dependency;
use crate::version::Version;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where a [PackageItem] came from and what role it currently plays in
/// the plan being built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PackageType {
    /// Named by the administrator.
    Explicit,

    /// Chosen by the planner to satisfy dependencies.
    Implicit,

    /// A repository candidate, not yet chosen nor discarded.
    Available,

    /// A record without installed files (`Not-Installed` or
    /// `Config-Files`).
    NotInstalled,

    /// Installed on the target.
    Installed,

    /// Unpacked on the target but not configured.
    Unpacked,

    /// An installed package selected for configuration in this session.
    Configure,

    /// An explicit item upgrading an installed package.
    Upgrade,

    /// An implicit item upgrading an installed package to satisfy a
    /// dependency.
    UpgradeImplicit,

    /// An explicit item downgrading an installed package.
    Downgrade,

    /// Determined to be unusable (wrong architecture, rejected by
    /// conflicts, lost the tree selection, ...).
    Invalid,

    /// Ignored because the exact version is already installed.
    Same,

    /// Discarded because a newer candidate of the same package exists.
    Older,

    /// A directory input, expanded into the archives it contains.
    Directory,
}

impl PackageType {
    /// Whether an item of this type is part of the unpack plan.
    pub fn is_to_install(&self) -> bool {
        matches!(
            self,
            Self::Explicit
                | Self::Implicit
                | Self::Upgrade
                | Self::UpgradeImplicit
                | Self::Downgrade
        )
    }

    /// Whether an item of this type describes something already on the
    /// target.
    pub fn is_installed_kind(&self) -> bool {
        matches!(
            self,
            Self::Installed | Self::Unpacked | Self::NotInstalled | Self::Configure
        )
    }
}

/// One package the planner knows about: an explicit input, a repository
/// candidate, or an installed record.
///
/// Items are loaded in two levels. Level one is the control fields only,
/// available from an in-memory buffer (the database record or a
/// repository index member); an item loaded this way has an unknown
/// installed status and no file data. Level two decodes the archive
/// itself and is only performed for items that end up being unpacked or
/// whose files must be examined.
///
/// Items cross-reference each other (an upgrade links the installed
/// instance it replaces) by index into the planner's flat item list,
/// never by reference.
pub struct PackageItem {
    name: String,
    version: Version,
    architecture: Architecture,
    item_type: PackageType,
    control: ControlFile,
    archive: Option<PathBuf>,
    reader: RefCell<Option<Rc<DebReader>>>,
    original_status: Option<PackageStatus>,
    upgrade: Option<usize>,
    unpacked: Cell<bool>,
    configured: Cell<bool>,
}

impl PackageItem {
    /// Build an item from a fully decoded archive (level two).
    pub(super) fn from_archive(
        path: &Path,
        reader: DebReader,
        item_type: PackageType,
    ) -> PackageItem {
        PackageItem {
            name: reader.name().to_owned(),
            version: reader.version().clone(),
            architecture: reader.architecture().clone(),
            item_type,
            control: reader.control().clone(),
            archive: Some(path.to_path_buf()),
            reader: RefCell::new(Some(Rc::new(reader))),
            original_status: None,
            upgrade: None,
            unpacked: Cell::new(false),
            configured: Cell::new(false),
        }
    }

    /// Build an item from control fields only (level one), remembering
    /// where the archive lives for a later full load.
    pub(super) fn from_control(
        name: &str,
        version: Version,
        architecture: Architecture,
        control: ControlFile,
        archive: Option<PathBuf>,
        item_type: PackageType,
    ) -> PackageItem {
        PackageItem {
            name: name.to_owned(),
            version,
            architecture,
            item_type,
            control,
            archive,
            reader: RefCell::new(None),
            original_status: None,
            upgrade: None,
            unpacked: Cell::new(false),
            configured: Cell::new(false),
        }
    }

    /// Build an item for an installed record (level one; the files are in
    /// the database, not in an archive).
    pub(super) fn from_installed(
        name: &str,
        control: ControlFile,
        status: PackageStatus,
        item_type: PackageType,
    ) -> Result<PackageItem, Error> {
        let version = control
            .field(fields::VERSION)
            .ok_or(Error::MissingField(fields::VERSION))?
            .parse::<Version>()?;
        let architecture = control
            .field(fields::ARCHITECTURE)
            .ok_or(Error::MissingField(fields::ARCHITECTURE))?
            .parse::<Architecture>()?;
        Ok(PackageItem {
            name: name.to_owned(),
            version,
            architecture,
            item_type,
            control,
            archive: None,
            reader: RefCell::new(None),
            original_status: Some(status),
            upgrade: None,
            unpacked: Cell::new(false),
            configured: Cell::new(false),
        })
    }

    /// The canonical package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The package architecture.
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// The current role of the item in the plan.
    pub fn item_type(&self) -> PackageType {
        self.item_type
    }

    pub(super) fn set_type(&mut self, item_type: PackageType) {
        self.item_type = item_type;
    }

    /// The archive file the item was (or will be) loaded from, if any.
    pub fn archive(&self) -> Option<&Path> {
        self.archive.as_deref()
    }

    /// The status the package had in the database when the session
    /// started; `None` when the item never was an installed record.
    pub fn original_status(&self) -> Option<PackageStatus> {
        self.original_status
    }

    pub(super) fn set_original_status(&mut self, status: Option<PackageStatus>) {
        self.original_status = status;
    }

    /// Index of the installed instance this item upgrades, if any.
    pub fn upgrade(&self) -> Option<usize> {
        self.upgrade
    }

    pub(super) fn set_upgrade(&mut self, upgrade: Option<usize>) {
        self.upgrade = upgrade;
    }

    /// Whether this item was unpacked by the current session.
    pub fn is_unpacked(&self) -> bool {
        self.unpacked.get()
    }

    pub(super) fn mark_unpacked(&self) {
        self.unpacked.set(true);
    }

    /// Whether this item was configured by the current session.
    pub fn is_configured(&self) -> bool {
        self.configured.get()
    }

    pub(super) fn mark_configured(&self) {
        self.configured.set(true);
    }

    /// Whether a control field is defined.
    pub fn field_is_defined(&self, name: &str) -> bool {
        self.control.field_is_defined(name)
    }

    /// Look up a control field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.control.field(name)
    }

    /// Read a control field as a boolean.
    pub fn get_boolean_field(&self, name: &str) -> bool {
        self.control.boolean_field(name)
    }

    /// Parse a dependency-valued control field. An absent field parses as
    /// `None`.
    pub fn dependency_field(&self, name: &str) -> Result<Option<Dependency>, Error> {
        match self.control.field(name) {
            Some(value) => Ok(Some(value.parse().map_err(|err| Error::BadField {
                package: self.name.clone(),
                field: name.to_owned(),
                error: Box::new(Error::Dependency(err)),
            })?)),
            None => Ok(None),
        }
    }

    /// Evaluate a field validation expression against this item's fields.
    pub fn validate_fields(&self, expression: &str) -> Result<bool, expression::Error> {
        expression::evaluate(expression, |field| {
            self.control.field(field).map(|v| v.to_owned())
        })
    }

    /// The names this package provides in addition to its own, from the
    /// `Provides` field.
    pub fn provides(&self) -> Vec<String> {
        match self.control.field(fields::PROVIDES) {
            Some(value) => value
                .split(',')
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
            None => vec![],
        }
    }

    /// Whether the package is flagged essential.
    pub fn is_essential(&self) -> bool {
        self.control.boolean_field(fields::ESSENTIAL)
    }

    /// The fully decoded archive of the item, loading it on first use
    /// (level two).
    pub fn reader(&self) -> Result<Rc<DebReader>, Error> {
        if let Some(reader) = &*self.reader.borrow() {
            return Ok(reader.clone());
        }
        let Some(archive) = &self.archive else {
            return Err(Error::NoArchive(self.name.clone()));
        };
        let reader = Rc::new(DebReader::open(archive)?);
        *self.reader.borrow_mut() = Some(reader.clone());
        Ok(reader)
    }

    /// Whether `path` is a conffile of this item (requires the archive).
    pub fn is_conffile(&self, path: &str) -> Result<bool, Error> {
        Ok(self.reader()?.is_conffile(path))
    }
}

// vim: foldmethod=marker

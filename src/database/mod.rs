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

//! The `database` module manages the on-disk target database of installed
//! packages.
//!
//! The layout under the database root is one directory per known package
//! (holding `control`, `wpkg-status`, `index.wpkgar`, `md5sums` and the
//! maintenance scripts), a `core` directory for the target's own record
//! (architecture, distribution, repository sources and the global hooks)
//! and a `tmp` directory for backup slots.
//!
//! A [Database] can only be obtained by taking the advisory lock; the
//! session owns the database until the value is dropped, and a second
//! acquisition fails fast. All mutating operations therefore run under the
//! lock by construction.

mod fileindex;
mod lock;
mod scripts;
mod status;

pub use fileindex::{FileEntry, FileIndex, FileKind};
pub use scripts::ScriptKind;
pub use status::{PackageStatus, Selection};

use crate::architecture::Architecture;
use crate::archive::{DebReader, EntryKind};
use crate::control::{fields, ControlFile};
use crate::dependency::is_package_name;
use crate::output::{Level, Output};
use crate::tracker::Tracker;
use md5::{Digest, Md5};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

const CORE: &str = "core";
const TMP: &str = "tmp";
const STATUS_FILE: &str = "wpkg-status";
const CONTROL_FILE: &str = "control";
const INDEX_FILE: &str = "index.wpkgar";
const MD5SUMS_FILE: &str = "md5sums";
const MD5SUMS_OLD_FILE: &str = "md5sums.wpkg-old";
const CONFFILES_FILE: &str = "conffiles";
const LOCK_FILE: &str = "wpkg.lck";

/// Error conditions which may be encountered working with a [Database].
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An underlying I/O operation failed on the given path.
    Io(PathBuf, std::io::Error),

    /// The database is locked by another session.
    Locked(PathBuf),

    /// The directory is not an initialized database.
    NotInitialized(PathBuf),

    /// The directory already holds a database.
    AlreadyInitialized(PathBuf),

    /// A package name failed the package naming rule.
    InvalidPackageName(String),

    /// The named package has no record in the database.
    PackageNotKnown(String),

    /// An `X-Status` value was not a recognized lifecycle status.
    InvalidStatus(String),

    /// An `X-Selection` value was not a recognized selection.
    InvalidSelection(String),

    /// A line of a file index did not parse.
    InvalidFileIndex(String),

    /// A line of an md5sums file did not parse.
    InvalidMd5sums(String),

    /// A control or status file did not parse.
    Control(crate::control::Error),

    /// The target architecture recorded in the core record is invalid.
    Architecture(crate::architecture::Error),

    /// The core record is missing a required field.
    MissingCoreField(&'static str),

    /// A path is not a plain relative path below the installation root.
    UnsafePath(PathBuf),

    /// A path would land inside the administrative database subtree.
    PathInsideDatabase(PathBuf),

    /// The operation was cancelled by the interrupt handler. Never
    /// demotable.
    Interrupted,

    /// Appending to the attached rollback journal failed.
    Tracker(crate::tracker::Error),
}
crate::errors::error_enum!(Error);

impl From<crate::control::Error> for Error {
    fn from(err: crate::control::Error) -> Self {
        Error::Control(err)
    }
}

impl From<crate::architecture::Error> for Error {
    fn from(err: crate::architecture::Error) -> Self {
        Error::Architecture(err)
    }
}

impl From<crate::tracker::Error> for Error {
    fn from(err: crate::tracker::Error) -> Self {
        Error::Tracker(err)
    }
}

pub(crate) fn io_ctx(path: &Path) -> impl Fn(std::io::Error) -> Error + '_ {
    move |err| Error::Io(path.to_path_buf(), err)
}

fn read_text(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(io_ctx(path))
}

/// Write a file atomically: the content lands in a temporary sibling which
/// is renamed over the destination.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), Error> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, content).map_err(io_ctx(&tmp))?;
    std::fs::rename(&tmp, path).map_err(io_ctx(path))
}

/// The current time in the RFC 2822 form used by the status date fields.
pub(crate) fn rfc2822_now() -> String {
    chrono::Utc::now().to_rfc2822()
}

/// An open (and therefore locked) installed-package database.
pub struct Database {
    root: PathBuf,
    inst_path: RefCell<PathBuf>,
    output: Rc<Output>,
    interrupt: RefCell<Option<Box<dyn Fn() -> bool>>>,
    tracker: RefCell<Option<Tracker>>,
    _lock: lock::Lock,
}

impl Database {
    /// Initialize a new database directory. The target architecture must
    /// be a concrete tuple; it becomes the `Architecture` field of the
    /// `core` record.
    pub fn create(root: &Path, architecture: &Architecture) -> Result<(), Error> {
        let core = root.join(CORE);
        let core_control = core.join(CONTROL_FILE);
        if core_control.exists() {
            return Err(Error::AlreadyInitialized(root.to_path_buf()));
        }
        for dir in [
            root.to_path_buf(),
            core.clone(),
            core.join("hooks"),
            core.join("indexes"),
            root.join(TMP),
            root.join(TMP).join("backup"),
        ] {
            std::fs::create_dir_all(&dir).map_err(io_ctx(&dir))?;
        }

        let mut control = ControlFile::new();
        control.set_field(fields::PACKAGE, CORE);
        control.set_field(fields::ARCHITECTURE, architecture.to_string());
        write_atomic(&core_control, control.to_string().as_bytes())?;

        let mut status = ControlFile::new();
        status.set_field(fields::PACKAGE, CORE);
        status.set_field(fields::X_STATUS, PackageStatus::Installed.as_str());
        write_atomic(&core.join(STATUS_FILE), status.to_string().as_bytes())
    }

    /// Open a database, acquiring the advisory lock. Fails fast with
    /// [Error::Locked] when another session holds it.
    pub fn open(root: &Path) -> Result<Self, Error> {
        Self::open_with_output(root, Rc::new(Output::default()))
    }

    /// Open a database delivering diagnostics to the given [Output].
    pub fn open_with_output(root: &Path, output: Rc<Output>) -> Result<Self, Error> {
        let root = root.canonicalize().map_err(io_ctx(root))?;
        if !root.join(CORE).join(CONTROL_FILE).exists() {
            return Err(Error::NotInitialized(root));
        }
        let lock = lock::Lock::acquire(&root.join(CORE).join(LOCK_FILE), "Session")?;
        let inst_path = root.parent().unwrap_or(&root).to_path_buf();
        Ok(Database {
            root,
            inst_path: RefCell::new(inst_path),
            output,
            interrupt: RefCell::new(None),
            tracker: RefCell::new(None),
            _lock: lock,
        })
    }

    /// The database root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The diagnostics sink of this session.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// A shared handle on the diagnostics sink.
    pub fn output_rc(&self) -> Rc<Output> {
        self.output.clone()
    }

    /// The installation root files are unpacked under. Defaults to the
    /// parent of the database root.
    pub fn inst_path(&self) -> PathBuf {
        self.inst_path.borrow().clone()
    }

    /// Change the installation root.
    pub fn set_inst_path(&self, path: &Path) {
        *self.inst_path.borrow_mut() = path.to_path_buf();
    }

    /// Install an interrupt handler. Long loops poll it through
    /// [Database::check_interrupt]; a handler returning true cancels the
    /// session.
    pub fn set_interrupt_handler(&self, handler: Box<dyn Fn() -> bool>) {
        *self.interrupt.borrow_mut() = Some(handler);
    }

    /// Poll the interrupt handler.
    pub fn check_interrupt(&self) -> Result<(), Error> {
        if let Some(handler) = &*self.interrupt.borrow() {
            if handler() {
                return Err(Error::Interrupted);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // journal attachment

    /// Attach a rollback journal. Every destructive step of a session
    /// records its inverse instruction through [Database::track] before
    /// performing the step.
    pub fn attach_tracker(&self, tracker: Tracker) {
        *self.tracker.borrow_mut() = Some(tracker);
    }

    /// Detach the journal again (to replay or commit it).
    pub fn detach_tracker(&self) -> Option<Tracker> {
        self.tracker.borrow_mut().take()
    }

    /// Record one inverse instruction in the attached journal, if any.
    pub fn track(&self, command: &str, package: &str) -> Result<(), Error> {
        if let Some(tracker) = &*self.tracker.borrow() {
            self.output.log(
                Level::Debug,
                "tracker",
                Some(package),
                "track",
                command.to_owned(),
            );
            tracker.track(command)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // core record

    fn core_dir(&self) -> PathBuf {
        self.root.join(CORE)
    }

    /// The directory holding the transient backup slots.
    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(TMP).join("backup")
    }

    /// A scratch directory inside the database.
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join(TMP)
    }

    /// The path of the `sources.list` of the target.
    pub fn sources_list_path(&self) -> PathBuf {
        self.core_dir().join("sources.list")
    }

    /// The target architecture from the core record.
    pub fn architecture(&self) -> Result<Architecture, Error> {
        match self.get_field(CORE, fields::ARCHITECTURE)? {
            Some(value) => Ok(value.parse()?),
            None => Err(Error::MissingCoreField(fields::ARCHITECTURE)),
        }
    }

    // ------------------------------------------------------------------
    // package records

    fn package_dir(&self, name: &str) -> Result<PathBuf, Error> {
        if name != CORE && !is_package_name(name) {
            return Err(Error::InvalidPackageName(name.to_owned()));
        }
        Ok(self.root.join(name))
    }

    /// Whether the database holds a record for the named package (in any
    /// status, including `Config-Files`).
    pub fn package_is_known(&self, name: &str) -> Result<bool, Error> {
        Ok(self.package_dir(name)?.join(STATUS_FILE).exists())
    }

    /// List every package the database has a record of, sorted. The core
    /// pseudo-package is not listed.
    pub fn list_installed_packages(&self) -> Result<Vec<String>, Error> {
        let mut ret = vec![];
        let entries = std::fs::read_dir(&self.root).map_err(io_ctx(&self.root))?;
        for entry in entries {
            let entry = entry.map_err(io_ctx(&self.root))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name == CORE || name == TMP {
                continue;
            }
            if entry.path().join(STATUS_FILE).exists() {
                ret.push(name);
            }
        }
        ret.sort();
        Ok(ret)
    }

    /// The lifecycle status of a package. Packages without a record are
    /// `Not-Installed`.
    pub fn package_status(&self, name: &str) -> Result<PackageStatus, Error> {
        match self.status_field(name, fields::X_STATUS)? {
            Some(status) => status.parse(),
            None => Ok(PackageStatus::NotInstalled),
        }
    }

    /// Update the lifecycle status of a package.
    pub fn set_package_status(&self, name: &str, status: PackageStatus) -> Result<(), Error> {
        self.output.log(
            Level::Debug,
            "database",
            Some(name),
            "status",
            format!("status set to {}", status),
        );
        self.set_field(name, fields::X_STATUS, status.as_str())
    }

    /// The selection of a package (`normal` when nothing is recorded).
    pub fn selection(&self, name: &str) -> Result<Selection, Error> {
        match self.get_field(name, fields::X_SELECTION)? {
            Some(selection) => selection.parse(),
            None => Ok(Selection::Normal),
        }
    }

    fn status_file(&self, name: &str) -> Result<Option<ControlFile>, Error> {
        let path = self.package_dir(name)?.join(STATUS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(ControlFile::parse(&read_text(&path)?)?))
    }

    fn status_field(&self, name: &str, field: &str) -> Result<Option<String>, Error> {
        Ok(self
            .status_file(name)?
            .and_then(|status| status.field(field).map(|v| v.to_owned())))
    }

    /// The control fields of an installed package.
    pub fn control_file(&self, name: &str) -> Result<ControlFile, Error> {
        let path = self.package_dir(name)?.join(CONTROL_FILE);
        if !path.exists() {
            return Err(Error::PackageNotKnown(name.to_owned()));
        }
        Ok(ControlFile::parse(&read_text(&path)?)?)
    }

    /// Read one field of one package: the status file takes precedence
    /// over the control file, so the engine's own `X-*` fields shadow
    /// nothing.
    pub fn get_field(&self, name: &str, field: &str) -> Result<Option<String>, Error> {
        if let Some(value) = self.status_field(name, field)? {
            return Ok(Some(value));
        }
        let path = self.package_dir(name)?.join(CONTROL_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(ControlFile::parse(&read_text(&path)?)?
            .field(field)
            .map(|v| v.to_owned()))
    }

    /// Whether a field is defined for a package.
    pub fn field_is_defined(&self, name: &str, field: &str) -> Result<bool, Error> {
        Ok(self.get_field(name, field)?.is_some())
    }

    /// Read a field as a boolean (`yes`, `true`, `1`).
    pub fn get_boolean_field(&self, name: &str, field: &str) -> Result<bool, Error> {
        Ok(match self.get_field(name, field)? {
            Some(value) => {
                value.eq_ignore_ascii_case("yes")
                    || value.eq_ignore_ascii_case("true")
                    || value == "1"
            }
            None => false,
        })
    }

    /// Write one field of one package into its status file, atomically
    /// (the whole status file is rewritten into a temporary sibling and
    /// renamed into place).
    pub fn set_field(&self, name: &str, field: &str, value: &str) -> Result<(), Error> {
        let dir = self.package_dir(name)?;
        if !dir.exists() {
            return Err(Error::PackageNotKnown(name.to_owned()));
        }
        let mut status = self.status_file(name)?.unwrap_or_else(|| {
            let mut status = ControlFile::new();
            status.set_field(fields::PACKAGE, name);
            status
        });
        status.set_field(field, value);
        write_atomic(&dir.join(STATUS_FILE), status.to_string().as_bytes())
    }

    /// Remove one field of one package from its status file.
    pub fn remove_field(&self, name: &str, field: &str) -> Result<(), Error> {
        let Some(mut status) = self.status_file(name)? else {
            return Ok(());
        };
        status.remove_field(field);
        write_atomic(
            &self.package_dir(name)?.join(STATUS_FILE),
            status.to_string().as_bytes(),
        )
    }

    /// Create (or refresh, on an upgrade) the record of a package from a
    /// decoded archive: control file, conffile list, maintenance scripts
    /// and md5sums. The lifecycle status of an existing record is kept;
    /// a new record starts `Not-Installed`.
    pub fn create_package_record(
        &self,
        reader: &DebReader,
        archive: Option<&Path>,
    ) -> Result<(), Error> {
        let name = reader.name().to_owned();
        let dir = self.package_dir(&name)?;
        std::fs::create_dir_all(&dir).map_err(io_ctx(&dir))?;

        write_atomic(
            &dir.join(CONTROL_FILE),
            reader.control().to_string().as_bytes(),
        )?;

        let mut conffiles = reader.conffiles().join("\n");
        if !conffiles.is_empty() {
            conffiles.push('\n');
        }
        write_atomic(&dir.join(CONFFILES_FILE), conffiles.as_bytes())?;

        let mut md5sums = String::new();
        for entry in reader.data_entries() {
            if entry.kind == EntryKind::File {
                md5sums.push_str(&format!(
                    "{}  {}\n",
                    hex::encode(Md5::digest(&entry.content)),
                    entry.path.display()
                ));
            }
        }
        write_atomic(&dir.join(MD5SUMS_FILE), md5sums.as_bytes())?;

        for script in crate::archive::SCRIPT_NAMES {
            let path = dir.join(script);
            match reader.scripts().get(*script) {
                Some(content) => {
                    write_atomic(&path, content)?;
                    make_executable(&path)?;
                }
                None => {
                    if path.exists() {
                        std::fs::remove_file(&path).map_err(io_ctx(&path))?;
                    }
                }
            }
        }

        if self.status_file(&name)?.is_none() {
            self.set_field(&name, fields::X_STATUS, PackageStatus::NotInstalled.as_str())?;
        }
        if let Some(archive) = archive {
            self.set_field(
                &name,
                fields::X_ARCHIVE_FILENAME,
                &archive.display().to_string(),
            )?;
        }
        Ok(())
    }

    /// Delete the whole record of a package (the final step of a purge).
    pub fn remove_package_record(&self, name: &str) -> Result<(), Error> {
        let dir = self.package_dir(name)?;
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(io_ctx(&dir))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // file index, conffiles, md5sums

    /// Store the file index of a package.
    pub fn install_file_index(&self, name: &str, index: &FileIndex) -> Result<(), Error> {
        write_atomic(
            &self.package_dir(name)?.join(INDEX_FILE),
            index.to_string().as_bytes(),
        )
    }

    /// Read the file index of a package. A missing index reads as empty.
    pub fn file_index(&self, name: &str) -> Result<FileIndex, Error> {
        let path = self.package_dir(name)?.join(INDEX_FILE);
        if !path.exists() {
            return Ok(FileIndex::default());
        }
        read_text(&path)?.parse()
    }

    /// The conffiles of a package, as declared when it was unpacked.
    pub fn conffiles(&self, name: &str) -> Result<Vec<String>, Error> {
        let path = self.package_dir(name)?.join(CONFFILES_FILE);
        if !path.exists() {
            return Ok(vec![]);
        }
        Ok(read_text(&path)?
            .lines()
            .map(|line| line.trim().to_owned())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Whether `path` (relative to the installation root, with or without
    /// a leading slash) is a conffile of the named package.
    pub fn is_conffile(&self, name: &str, path: &str) -> Result<bool, Error> {
        let path = path.trim_start_matches('/');
        Ok(self
            .conffiles(name)?
            .iter()
            .any(|conffile| conffile.trim_start_matches('/') == path))
    }

    fn parse_md5sums(&self, path: &Path) -> Result<BTreeMap<String, String>, Error> {
        let mut ret = BTreeMap::new();
        for line in read_text(path)?.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.len() < 35 {
                return Err(Error::InvalidMd5sums(line.to_owned()));
            }
            let (digest, rest) = line.split_at(32);
            if !digest.chars().all(|ch| ch.is_ascii_hexdigit()) {
                return Err(Error::InvalidMd5sums(line.to_owned()));
            }
            let rest = rest.strip_prefix("  ").or_else(|| rest.strip_prefix(" *"));
            let Some(filename) = rest else {
                return Err(Error::InvalidMd5sums(line.to_owned()));
            };
            ret.insert(filename.to_owned(), digest.to_owned());
        }
        Ok(ret)
    }

    /// The stored md5sums of a package's files, keyed by relative path.
    pub fn md5sums(&self, name: &str) -> Result<BTreeMap<String, String>, Error> {
        let path = self.package_dir(name)?.join(MD5SUMS_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        self.parse_md5sums(&path)
    }

    /// The md5sums of the previous version during an upgrade
    /// (`md5sums.wpkg-old`), used to tell user-modified conffiles apart
    /// from pristine ones.
    pub fn previous_md5sums(&self, name: &str) -> Result<BTreeMap<String, String>, Error> {
        let path = self.package_dir(name)?.join(MD5SUMS_OLD_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        self.parse_md5sums(&path)
    }

    /// Rotate `md5sums` to `md5sums.wpkg-old` at the start of an upgrade.
    pub fn rotate_md5sums(&self, name: &str) -> Result<(), Error> {
        let dir = self.package_dir(name)?;
        let current = dir.join(MD5SUMS_FILE);
        if current.exists() {
            let old = dir.join(MD5SUMS_OLD_FILE);
            std::fs::rename(&current, &old).map_err(io_ctx(&old))?;
        }
        Ok(())
    }

    /// Drop the rotated md5sums once an upgrade completed.
    pub fn drop_previous_md5sums(&self, name: &str) -> Result<(), Error> {
        let path = self.package_dir(name)?.join(MD5SUMS_OLD_FILE);
        if path.exists() {
            std::fs::remove_file(&path).map_err(io_ctx(&path))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // installation paths

    /// Resolve a path relative to the installation root, refusing
    /// absolute paths, parent traversal, and anything that would land
    /// inside the administrative database subtree.
    pub fn install_target(&self, relative: &Path) -> Result<PathBuf, Error> {
        let mut clean = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                _ => return Err(Error::UnsafePath(relative.to_path_buf())),
            }
        }
        if clean.as_os_str().is_empty() {
            return Err(Error::UnsafePath(relative.to_path_buf()));
        }
        let target = self.inst_path.borrow().join(clean);
        if target.starts_with(&self.root) {
            return Err(Error::PathInsideDatabase(target));
        }
        Ok(target)
    }

    // ------------------------------------------------------------------
    // maintenance scripts and hooks

    /// The path a maintenance script of a package would live at.
    pub fn script_path(&self, name: &str, kind: ScriptKind) -> Result<PathBuf, Error> {
        Ok(self.package_dir(name)?.join(kind.as_str()))
    }

    /// Whether the named package carries the given maintenance script.
    pub fn has_script(&self, name: &str, kind: ScriptKind) -> Result<bool, Error> {
        Ok(self.script_path(name, kind)?.exists())
    }

    /// Run a maintenance script of a package. A package without the
    /// script succeeds trivially. Returns whether the script exited
    /// successfully.
    pub fn run_script(
        &self,
        name: &str,
        kind: ScriptKind,
        args: &[&str],
    ) -> Result<bool, Error> {
        let path = self.script_path(name, kind)?;
        if !path.exists() {
            return Ok(true);
        }
        self.run_script_file(&path, name, args)
    }

    /// Run a script by path (used for the `validate` scripts of packages
    /// that have no database record yet).
    pub fn run_script_file(
        &self,
        path: &Path,
        package: &str,
        args: &[&str],
    ) -> Result<bool, Error> {
        self.check_interrupt()?;
        self.output.log(
            Level::Debug,
            "run-script",
            Some(package),
            "script",
            format!("{} {}", path.display(), args.join(" ")),
        );
        let status = std::process::Command::new(path)
            .args(args)
            .current_dir(self.inst_path())
            .status()
            .map_err(io_ctx(path))?;
        Ok(status.success())
    }

    fn hooks_dir(&self) -> PathBuf {
        self.core_dir().join("hooks")
    }

    /// Install a global hook script on behalf of a package. The hook runs
    /// for every action of the matching kind, on any package.
    pub fn add_hook(&self, package: &str, kind: ScriptKind, content: &[u8]) -> Result<(), Error> {
        let dir = self.hooks_dir();
        std::fs::create_dir_all(&dir).map_err(io_ctx(&dir))?;
        let path = dir.join(format!("{}_{}", package, kind.as_str()));
        write_atomic(&path, content)?;
        make_executable(&path)
    }

    /// Remove every global hook a package installed.
    pub fn remove_hooks(&self, package: &str) -> Result<(), Error> {
        let dir = self.hooks_dir();
        if !dir.exists() {
            return Ok(());
        }
        let prefix = format!("{}_", package);
        let entries = std::fs::read_dir(&dir).map_err(io_ctx(&dir))?;
        for entry in entries {
            let entry = entry.map_err(io_ctx(&dir))?;
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(&prefix)
            {
                std::fs::remove_file(entry.path()).map_err(io_ctx(&entry.path()))?;
            }
        }
        Ok(())
    }

    /// Run every global hook of the given kind, sorted by file name, with
    /// the same argument tuple. Returns false as soon as one hook fails.
    pub fn run_global_hooks(&self, kind: ScriptKind, args: &[&str]) -> Result<bool, Error> {
        let dir = self.hooks_dir();
        if !dir.exists() {
            return Ok(true);
        }
        let suffix = format!("_{}", kind.as_str());
        let mut hooks = vec![];
        let entries = std::fs::read_dir(&dir).map_err(io_ctx(&dir))?;
        for entry in entries {
            let entry = entry.map_err(io_ctx(&dir))?;
            if entry.file_name().to_string_lossy().ends_with(&suffix) {
                hooks.push(entry.path());
            }
        }
        hooks.sort();
        for hook in hooks {
            if !self.run_script_file(&hook, CORE, args)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(io_ctx(path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), Error> {
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::DebBuilder;

    fn test_arch() -> Architecture {
        "linux-amd64".parse().unwrap()
    }

    fn new_db(root: &Path) -> Database {
        Database::create(root, &test_arch()).unwrap();
        Database::open(root).unwrap()
    }

    fn sample_deb(name: &str, version: &str) -> Vec<u8> {
        let mut ctrl = ControlFile::new();
        ctrl.set_field(fields::PACKAGE, name);
        ctrl.set_field(fields::VERSION, version);
        ctrl.set_field(fields::ARCHITECTURE, "linux-amd64");
        DebBuilder::new(ctrl)
            .install_file("usr/bin/tool", b"content\n", 0o755)
            .install_conffile("etc/tool.conf", b"a = 1\n")
            .build()
            .unwrap()
    }

    #[test]
    fn create_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        Database::create(&root, &test_arch()).unwrap();
        assert!(matches!(
            Database::create(&root, &test_arch()),
            Err(Error::AlreadyInitialized(_))
        ));
        let db = Database::open(&root).unwrap();
        assert_eq!("linux-amd64", db.architecture().unwrap().to_string());
        assert!(db.list_installed_packages().unwrap().is_empty());
    }

    #[test]
    fn lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let db = new_db(&root);
        assert!(matches!(Database::open(&root), Err(Error::Locked(_))));
        drop(db);
        Database::open(&root).unwrap();
    }

    #[test]
    fn open_requires_initialization() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Database::open(dir.path()),
            Err(Error::NotInitialized(_))
        ));
    }

    #[test]
    fn record_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));
        let reader = DebReader::parse(&sample_deb("tool", "1.0")).unwrap();
        db.create_package_record(&reader, None).unwrap();

        assert!(db.package_is_known("tool").unwrap());
        assert_eq!(vec!["tool".to_owned()], db.list_installed_packages().unwrap());
        assert_eq!(
            PackageStatus::NotInstalled,
            db.package_status("tool").unwrap()
        );
        db.set_package_status("tool", PackageStatus::Installed).unwrap();
        assert_eq!(PackageStatus::Installed, db.package_status("tool").unwrap());

        assert_eq!(Some("1.0".to_owned()), db.get_field("tool", "Version").unwrap());
        assert!(db.is_conffile("tool", "etc/tool.conf").unwrap());
        assert!(db.is_conffile("tool", "/etc/tool.conf").unwrap());
        assert!(!db.is_conffile("tool", "usr/bin/tool").unwrap());

        let sums = db.md5sums("tool").unwrap();
        assert_eq!(2, sums.len());
        assert!(sums.contains_key("usr/bin/tool"));

        db.rotate_md5sums("tool").unwrap();
        assert!(db.md5sums("tool").unwrap().is_empty());
        assert_eq!(2, db.previous_md5sums("tool").unwrap().len());

        db.remove_package_record("tool").unwrap();
        assert!(!db.package_is_known("tool").unwrap());
        assert_eq!(
            PackageStatus::NotInstalled,
            db.package_status("tool").unwrap()
        );
    }

    #[test]
    fn file_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));
        let reader = DebReader::parse(&sample_deb("tool", "1.0")).unwrap();
        db.create_package_record(&reader, None).unwrap();

        let index = FileIndex::from_data_entries(reader.data_entries());
        db.install_file_index("tool", &index).unwrap();
        assert_eq!(index, db.file_index("tool").unwrap());
        assert!(db
            .file_index("tool")
            .unwrap()
            .contains(Path::new("usr/bin/tool")));
    }

    #[test]
    fn install_target_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));
        let target = db.install_target(Path::new("usr/bin/tool")).unwrap();
        assert!(target.starts_with(db.inst_path()));
        assert!(matches!(
            db.install_target(Path::new("../evil")),
            Err(Error::UnsafePath(_))
        ));
        assert!(matches!(
            db.install_target(Path::new("/etc/passwd")),
            Err(Error::UnsafePath(_))
        ));
        assert!(matches!(
            db.install_target(Path::new("db/tool/control")),
            Err(Error::PathInsideDatabase(_))
        ));
    }

    #[test]
    fn interrupt_handler_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));
        db.check_interrupt().unwrap();
        db.set_interrupt_handler(Box::new(|| true));
        assert!(matches!(db.check_interrupt(), Err(Error::Interrupted)));
    }

    #[cfg(unix)]
    #[test]
    fn scripts_and_hooks_run() {
        let dir = tempfile::tempdir().unwrap();
        let db = new_db(&dir.path().join("db"));

        let mut ctrl = ControlFile::new();
        ctrl.set_field(fields::PACKAGE, "tool");
        ctrl.set_field(fields::VERSION, "1.0");
        ctrl.set_field(fields::ARCHITECTURE, "linux-amd64");
        let deb = DebBuilder::new(ctrl)
            .script("postinst", b"#!/bin/sh\nexit 0\n")
            .script("prerm", b"#!/bin/sh\nexit 1\n")
            .build()
            .unwrap();
        let reader = DebReader::parse(&deb).unwrap();
        db.create_package_record(&reader, None).unwrap();

        assert!(db.has_script("tool", ScriptKind::Postinst).unwrap());
        assert!(!db.has_script("tool", ScriptKind::Preinst).unwrap());
        assert!(db
            .run_script("tool", ScriptKind::Postinst, &["configure", "1.0"])
            .unwrap());
        assert!(!db.run_script("tool", ScriptKind::Prerm, &["remove"]).unwrap());
        // a missing script succeeds trivially
        assert!(db.run_script("tool", ScriptKind::Preinst, &["install"]).unwrap());

        db.add_hook("tool", ScriptKind::Postinst, b"#!/bin/sh\nexit 0\n")
            .unwrap();
        assert!(db
            .run_global_hooks(ScriptKind::Postinst, &["configure", "tool", "1.0"])
            .unwrap());
        db.add_hook("other", ScriptKind::Postinst, b"#!/bin/sh\nexit 3\n")
            .unwrap();
        assert!(!db
            .run_global_hooks(ScriptKind::Postinst, &["configure", "tool", "1.0"])
            .unwrap());
        db.remove_hooks("other").unwrap();
        assert!(db
            .run_global_hooks(ScriptKind::Postinst, &["configure", "tool", "1.0"])
            .unwrap());
    }
}

// vim: foldmethod=marker

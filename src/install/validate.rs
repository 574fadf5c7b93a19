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

//! The validation pipeline of the [Installer].
//!
//! The steps run in a fixed order and have side effects on purpose: as
//! they check the package set they also compute the final plan (or find
//! out that the operands cannot be installed). Most steps record their
//! problems through the session output and keep scanning so that one run
//! reports everything that is wrong with a package set.

use super::item::{PackageItem, PackageType};
use super::{Error, Force, Installer, Mode};
use crate::archive::DebReader;
use crate::control::fields;
use crate::database::PackageStatus;
use crate::dependency::{is_package_name, Possibility};
use crate::output::Level;
use crate::repository;
use crate::version::Version;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

impl Installer<'_> {
    // ------------------------------------------------------------------
    // installing / unpacking

    pub(super) fn validate_installation(&mut self) -> Result<(), Error> {
        let start = self.db.output().error_count();
        let clean = |installer: &Installer| installer.db.output().error_count() == start;

        self.expand_directories()?;
        self.load_explicit_packages()?;
        if !clean(self) {
            return Ok(());
        }
        self.load_installed_packages()?;
        self.detect_source_install();
        self.validate_architecture();
        self.classify_upgrades()?;
        if !clean(self) {
            return Ok(());
        }
        self.validate_predependencies()?;
        self.validate_dependencies()?;
        self.validate_distribution()?;
        self.validate_packager_version();
        self.validate_field_expressions();
        if !clean(self) {
            return Ok(());
        }
        self.validate_size_and_overwrite()?;
        if !clean(self) {
            return Ok(());
        }
        self.validate_scripts()?;
        self.sort_packages()?;
        Ok(())
    }

    /// Expand directory operands into the archives they contain
    /// (recursing only under the recursive force). An empty expansion is
    /// fatal.
    fn expand_directories(&mut self) -> Result<(), Error> {
        let mut expanded = vec![];
        for input in std::mem::take(&mut self.inputs) {
            let path = Path::new(&input);
            if !path.is_dir() {
                expanded.push(input);
                continue;
            }
            let mut found = vec![];
            let mut stack = vec![path.to_path_buf()];
            while let Some(dir) = stack.pop() {
                self.db.check_interrupt()?;
                let entries =
                    std::fs::read_dir(&dir).map_err(|err| Error::Io(dir.clone(), err))?;
                for entry in entries {
                    let entry = entry.map_err(|err| Error::Io(dir.clone(), err))?;
                    let entry = entry.path();
                    if entry.is_dir() {
                        if self.force(Force::Recursive) {
                            stack.push(entry);
                        }
                    } else if entry.extension().map(|ext| ext == "deb").unwrap_or(false) {
                        found.push(entry);
                    }
                }
            }
            if found.is_empty() {
                self.log(
                    Level::Fatal,
                    None,
                    "validate-directories",
                    format!("directory {:?} contains no archives", path),
                );
                return Err(Error::EmptyDirectory(path.to_path_buf()));
            }
            found.sort();
            expanded.extend(found.into_iter().map(|p| p.display().to_string()));
        }
        self.inputs = expanded;
        Ok(())
    }

    /// Materialize the explicit operands: archives are decoded in full,
    /// bare names are resolved against the repositories.
    fn load_explicit_packages(&mut self) -> Result<(), Error> {
        for input in std::mem::take(&mut self.inputs) {
            self.db.check_interrupt()?;
            let path = Path::new(&input);
            if path.is_file() {
                match DebReader::open(path) {
                    Ok(reader) => {
                        self.push_explicit(PackageItem::from_archive(
                            path,
                            reader,
                            PackageType::Explicit,
                        ));
                    }
                    Err(err) => {
                        self.log(
                            Level::Error,
                            None,
                            "validate-packages",
                            format!("archive {:?} cannot be read: {}", path, err),
                        );
                    }
                }
                continue;
            }
            if input.ends_with(".deb") {
                // a plain archive file name, to be found in a repository
                match self.find_archive_in_repositories(path) {
                    Some(found) => match DebReader::open(&found) {
                        Ok(reader) => {
                            self.push_explicit(PackageItem::from_archive(
                                &found,
                                reader,
                                PackageType::Explicit,
                            ));
                        }
                        Err(err) => {
                            self.log(
                                Level::Error,
                                None,
                                "validate-packages",
                                format!("archive {:?} cannot be read: {}", found, err),
                            );
                        }
                    },
                    None => {
                        self.log(
                            Level::Error,
                            None,
                            "validate-packages",
                            format!("archive {:?} not found in any repository", input),
                        );
                    }
                }
                continue;
            }
            // a bare package name, resolved through the repository indexes
            if !is_package_name(&input) {
                self.log(
                    Level::Error,
                    None,
                    "validate-packages",
                    format!("{:?} is not a valid package name", input),
                );
                continue;
            }
            self.load_repositories()?;
            match self.best_available(&input) {
                Some(idx) => {
                    self.packages[idx].set_type(PackageType::Explicit);
                }
                None => {
                    self.log(
                        Level::Error,
                        Some(&input),
                        "validate-packages",
                        format!("no installable candidate for {:?} in any repository", input),
                    );
                }
            }
        }
        Ok(())
    }

    fn push_explicit(&mut self, item: PackageItem) {
        if self
            .find_item_by_name(item.name(), |other| {
                matches!(
                    other.item_type(),
                    PackageType::Explicit | PackageType::Upgrade | PackageType::Downgrade
                )
            })
            .is_some()
        {
            self.log(
                Level::Error,
                Some(item.name()),
                "validate-packages",
                format!("package {:?} was specified more than once", item.name()),
            );
            return;
        }
        self.packages.push(item);
    }

    /// The repository directories of the session: explicit ones first,
    /// then the local entries of the target's `sources.list`.
    pub(super) fn repository_dirs(&self) -> Result<Vec<PathBuf>, Error> {
        let mut ret = self.repositories.clone();
        let sources_list = self.db.sources_list_path();
        if sources_list.exists() {
            let text = std::fs::read_to_string(&sources_list)
                .map_err(|err| Error::Io(sources_list.clone(), err))?;
            for source in repository::parse_sources(&text)? {
                if source.source_type.is_source() {
                    continue;
                }
                let uri = source.uri.strip_prefix("file://").unwrap_or(&source.uri);
                let mut dir = PathBuf::from(uri);
                if source.distribution != "./" {
                    dir.push(source.distribution.trim_end_matches('/'));
                }
                ret.push(dir);
            }
        }
        Ok(ret)
    }

    fn find_archive_in_repositories(&self, filename: &Path) -> Option<PathBuf> {
        let name = filename.file_name()?;
        for dir in self.repository_dirs().ok()? {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Read every configured repository index (creating missing indexes
    /// for local repositories on the way) and add the
    /// architecture-compatible entries as `Available` candidates.
    pub(super) fn load_repositories(&mut self) -> Result<(), Error> {
        if self.repositories_loaded {
            return Ok(());
        }
        self.repositories_loaded = true;
        let target = self.target_arch().clone();
        let ignore_vendor = self.force(Force::Vendor);
        for dir in self.repository_dirs()? {
            self.db.check_interrupt()?;
            if !dir.is_dir() {
                self.log(
                    Level::Warning,
                    None,
                    "validate-repositories",
                    format!("repository {:?} does not exist, skipped", dir),
                );
                continue;
            }
            let entries =
                repository::read_repository(&dir, self.force(Force::Recursive))?;
            for entry in entries {
                if !entry.compatible_with(&target, ignore_vendor)
                    && !self.force(Force::Architecture)
                {
                    self.log(
                        Level::Debug,
                        Some(&entry.name),
                        "validate-repositories",
                        format!(
                            "candidate {} {} skipped, architecture incompatible with {}",
                            entry.name, entry.version, target
                        ),
                    );
                    continue;
                }
                // the same name and version showing up in two
                // repositories is the same candidate; first one wins
                if self
                    .find_item_by_name(&entry.name, |item| {
                        item.item_type() == PackageType::Available
                            && item.version() == &entry.version
                    })
                    .is_some()
                {
                    continue;
                }
                let architecture = entry
                    .architecture
                    .clone()
                    .unwrap_or(crate::architecture::Architecture::Source);
                let archive = entry.archive_path(&dir);
                self.packages.push(PackageItem::from_control(
                    &entry.name.clone(),
                    entry.version.clone(),
                    architecture,
                    entry.control,
                    Some(archive),
                    PackageType::Available,
                ));
            }
        }
        Ok(())
    }

    /// The best (highest-version) `Available` candidate for a name.
    pub(super) fn best_available(&self, name: &str) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, item) in self.packages.iter().enumerate() {
            if item.item_type() != PackageType::Available || item.name() != name {
                continue;
            }
            match best {
                Some(current) if self.packages[current].version() >= item.version() => {}
                _ => best = Some(idx),
            }
        }
        best
    }

    /// Load every installed record as an item, failing on packages whose
    /// state needs repair first.
    fn load_installed_packages(&mut self) -> Result<(), Error> {
        for name in self.db.list_installed_packages()? {
            self.db.check_interrupt()?;
            let status = self.db.package_status(&name)?;
            let item_type = match status {
                PackageStatus::Installed => PackageType::Installed,
                PackageStatus::Unpacked | PackageStatus::HalfConfigured => PackageType::Unpacked,
                PackageStatus::ConfigFiles | PackageStatus::NotInstalled => {
                    PackageType::NotInstalled
                }
                PackageStatus::HalfInstalled
                | PackageStatus::Removing
                | PackageStatus::Purging => {
                    self.log(
                        Level::Error,
                        Some(&name),
                        "validate-installed",
                        format!(
                            "package {:?} is in state {} and needs repair before anything else can be installed",
                            name, status
                        ),
                    );
                    continue;
                }
            };
            let control = match self.db.control_file(&name) {
                Ok(control) => control,
                Err(crate::database::Error::PackageNotKnown(_)) => continue,
                Err(err) => return Err(err.into()),
            };
            match PackageItem::from_installed(&name, control, status, item_type) {
                Ok(item) => self.packages.push(item),
                Err(err) => {
                    self.log(
                        Level::Error,
                        Some(&name),
                        "validate-installed",
                        format!("installed package {:?} has a bad record: {}", name, err),
                    );
                }
            }
        }
        Ok(())
    }

    /// Source operands switch the session to also honoring the
    /// build-dependency fields.
    fn detect_source_install(&mut self) {
        self.install_source = self
            .packages
            .iter()
            .any(|item| item.item_type() == PackageType::Explicit && item.architecture().is_source());
    }

    /// Explicit packages must be built for the target architecture
    /// (`all` and source packages always fit).
    fn validate_architecture(&mut self) {
        let target = self.target_arch().clone();
        let ignore_vendor = self.force(Force::Vendor);
        for idx in 0..self.packages.len() {
            let item = &self.packages[idx];
            if item.item_type() != PackageType::Explicit {
                continue;
            }
            let arch = item.architecture();
            if arch.is_all() || arch.is_source() {
                continue;
            }
            if !target.matches(arch, ignore_vendor) {
                let name = item.name().to_owned();
                self.report(
                    Force::Architecture,
                    Some(&name),
                    "validate-architecture",
                    format!(
                        "package {:?} is built for {} but the target is {}",
                        name,
                        arch,
                        target
                    ),
                );
                if !self.force(Force::Architecture) {
                    self.packages[idx].set_type(PackageType::Invalid);
                }
            }
        }
    }

    /// Compare every explicit item against the installed instance of the
    /// same name: upgrades are linked, same versions skipped or
    /// reinstalled, downgrades and held packages gated on their forces.
    fn classify_upgrades(&mut self) -> Result<(), Error> {
        for idx in 0..self.packages.len() {
            if self.packages[idx].item_type() != PackageType::Explicit {
                continue;
            }
            let name = self.packages[idx].name().to_owned();
            let Some(installed_idx) = self.find_item_by_name(&name, |item| {
                matches!(
                    item.item_type(),
                    PackageType::Installed | PackageType::Unpacked | PackageType::NotInstalled
                )
            }) else {
                continue;
            };

            let new_version = self.packages[idx].version().clone();
            let old_version = self.packages[installed_idx].version().clone();
            let installed_kind = self.packages[installed_idx].item_type();
            let has_files = matches!(
                installed_kind,
                PackageType::Installed | PackageType::Unpacked
            );

            // `Config-Files` leftovers install fresh; their old version
            // only matters for the preinst arguments
            if !has_files {
                continue;
            }

            if self.db.selection(&name)? == crate::database::Selection::Hold
                && new_version != old_version
            {
                self.report(
                    Force::Hold,
                    Some(&name),
                    "validate-upgrade",
                    format!("package {:?} is on hold and will not be replaced", name),
                );
                if !self.force(Force::Hold) {
                    self.packages[idx].set_type(PackageType::Invalid);
                    continue;
                }
            }

            if new_version > old_version {
                if let Some(minimum) = self.packages[idx]
                    .field(fields::MINIMUM_UPGRADABLE_VERSION)
                    .map(|v| v.parse::<Version>())
                {
                    let minimum = minimum.map_err(|err| Error::BadField {
                        package: name.clone(),
                        field: fields::MINIMUM_UPGRADABLE_VERSION.to_owned(),
                        error: Box::new(err.into()),
                    })?;
                    if old_version < minimum {
                        self.report(
                            Force::UpgradeAnyVersion,
                            Some(&name),
                            "validate-upgrade",
                            format!(
                                "package {:?} can only be upgraded from {} on, {} is installed",
                                name, minimum, old_version
                            ),
                        );
                        if !self.force(Force::UpgradeAnyVersion) {
                            self.packages[idx].set_type(PackageType::Invalid);
                            continue;
                        }
                    }
                }
                self.packages[idx].set_type(PackageType::Upgrade);
                self.packages[idx].set_upgrade(Some(installed_idx));
            } else if new_version == old_version {
                if self.force(Force::SkipSameVersion) {
                    self.log(
                        Level::Info,
                        Some(&name),
                        "validate-upgrade",
                        format!("package {:?} is already at {}, skipped", name, new_version),
                    );
                    self.packages[idx].set_type(PackageType::Same);
                } else {
                    // reinstalling over itself is a same-version upgrade
                    self.packages[idx].set_type(PackageType::Upgrade);
                    self.packages[idx].set_upgrade(Some(installed_idx));
                }
            } else {
                self.report(
                    Force::Downgrade,
                    Some(&name),
                    "validate-upgrade",
                    format!(
                        "package {:?} would be downgraded from {} to {}",
                        name, old_version, new_version
                    ),
                );
                if self.force(Force::Downgrade) {
                    self.packages[idx].set_type(PackageType::Downgrade);
                    self.packages[idx].set_upgrade(Some(installed_idx));
                } else {
                    self.packages[idx].set_type(PackageType::Invalid);
                }
            }
        }
        Ok(())
    }

    /// Every `Pre-Depends` atom of an explicit item must be satisfied by
    /// a package already in `Installed` state (or `Unpacked`, under the
    /// configure-any force).
    fn validate_predependencies(&mut self) -> Result<(), Error> {
        let target = self.target_arch().clone();
        let ignore_vendor = self.force(Force::Vendor);
        for idx in 0..self.packages.len() {
            if !self.packages[idx].item_type().is_to_install() {
                continue;
            }
            let name = self.packages[idx].name().to_owned();
            let Some(dependency) = self.packages[idx].dependency_field(fields::PRE_DEPENDS)?
            else {
                continue;
            };
            for relation in &dependency.relations {
                let mut satisfied = false;
                for possibility in &relation.possibilities {
                    if !possibility.applies_to(&target, ignore_vendor) {
                        continue;
                    }
                    if self.predependency_satisfied(possibility)? {
                        satisfied = true;
                        break;
                    }
                }
                if !satisfied {
                    self.report(
                        Force::Depends,
                        Some(&name),
                        "validate-predependencies",
                        format!(
                            "pre-dependency {:?} of package {:?} is not satisfied by an installed package",
                            relation.to_string(),
                            name
                        ),
                    );
                }
            }
        }
        Ok(())
    }

    fn predependency_satisfied(&self, possibility: &Possibility) -> Result<bool, Error> {
        let Some(idx) = self.find_item_by_name(&possibility.name, |item| {
            matches!(
                item.item_type(),
                PackageType::Installed | PackageType::Unpacked
            )
        }) else {
            return Ok(false);
        };
        let item = &self.packages[idx];
        if !possibility.version_matches(item.version()) {
            return Ok(false);
        }
        match item.item_type() {
            PackageType::Installed => Ok(true),
            PackageType::Unpacked => Ok(self.force(Force::ConfigureAny)),
            _ => Ok(false),
        }
    }

    /// The target may pin a distribution; every binary being installed
    /// must then declare the same one.
    fn validate_distribution(&mut self) -> Result<(), Error> {
        let Some(distribution) = self.db.get_field("core", fields::DISTRIBUTION)? else {
            return Ok(());
        };
        for idx in 0..self.packages.len() {
            let item = &self.packages[idx];
            if !item.item_type().is_to_install() || item.architecture().is_source() {
                continue;
            }
            let name = item.name().to_owned();
            match item.field(fields::DISTRIBUTION) {
                None => {
                    self.report(
                        Force::Distribution,
                        Some(&name),
                        "validate-distribution",
                        format!(
                            "package {:?} declares no distribution but the target requires {:?}",
                            name, distribution
                        ),
                    );
                }
                Some(theirs) if theirs != distribution => {
                    let theirs = theirs.to_owned();
                    self.report(
                        Force::Distribution,
                        Some(&name),
                        "validate-distribution",
                        format!(
                            "package {:?} is for distribution {:?}, the target requires {:?}",
                            name, theirs, distribution
                        ),
                    );
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Packages produced by a newer packager than this one get a
    /// warning; they may use features this version does not understand.
    fn validate_packager_version(&mut self) {
        let ours: Version = env!("CARGO_PKG_VERSION")
            .parse()
            .expect("the crate version is a valid package version");
        for item in &self.packages {
            if !item.item_type().is_to_install() {
                continue;
            }
            let Some(theirs) = item.field(fields::PACKAGER_VERSION) else {
                continue;
            };
            match theirs.parse::<Version>() {
                Ok(theirs) if theirs > ours => {
                    self.log(
                        Level::Warning,
                        Some(item.name()),
                        "validate-packager-version",
                        format!(
                            "package {:?} was built by packager {}, this is {}",
                            item.name(),
                            theirs,
                            ours
                        ),
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    self.log(
                        Level::Warning,
                        Some(item.name()),
                        "validate-packager-version",
                        format!(
                            "package {:?} has an unparsable Packager-Version: {}",
                            item.name(),
                            err
                        ),
                    );
                }
            }
        }
    }

    /// Apply the administrator's field validation expressions to every
    /// explicit package.
    fn validate_field_expressions(&mut self) {
        for expression in &self.field_validations {
            for item in &self.packages {
                if !matches!(
                    item.item_type(),
                    PackageType::Explicit | PackageType::Upgrade | PackageType::Downgrade
                ) {
                    continue;
                }
                match item.validate_fields(expression) {
                    Ok(true) => {}
                    Ok(false) => {
                        self.log(
                            Level::Error,
                            Some(item.name()),
                            "validate-fields",
                            format!(
                                "package {:?} does not satisfy {:?}",
                                item.name(),
                                expression
                            ),
                        );
                    }
                    Err(err) => {
                        self.log(
                            Level::Error,
                            Some(item.name()),
                            "validate-fields",
                            format!("expression {:?} cannot be evaluated: {}", expression, err),
                        );
                    }
                }
            }
        }
    }

    /// Run the `validate` script of every package being installed, plus
    /// the target's global `validate` hooks. Any failure is fatal.
    fn validate_scripts(&mut self) -> Result<(), Error> {
        for idx in 0..self.packages.len() {
            if !self.packages[idx].item_type().is_to_install() {
                continue;
            }
            let name = self.packages[idx].name().to_owned();
            let version = self.packages[idx].version().to_string();

            let reader = match self.packages[idx].reader() {
                Ok(reader) => reader,
                Err(err) => {
                    self.log(
                        Level::Error,
                        Some(&name),
                        "validate-scripts",
                        format!("package {:?} cannot be loaded: {}", name, err),
                    );
                    continue;
                }
            };
            if let Some(content) = reader.scripts().get("validate") {
                let path = self.db.tmp_dir().join(format!("validate-{}", name));
                std::fs::write(&path, content).map_err(|err| Error::Io(path.clone(), err))?;
                set_executable(&path)?;
                let ok = self.db.run_script_file(&path, &name, &[])?;
                let _ = std::fs::remove_file(&path);
                if !ok {
                    self.log(
                        Level::Fatal,
                        Some(&name),
                        "validate-scripts",
                        format!("the validate script of package {:?} refused the installation", name),
                    );
                    continue;
                }
            }
            if !self
                .db
                .run_global_hooks(crate::database::ScriptKind::Validate, &[
                    "validate",
                    name.as_str(),
                    version.as_str(),
                ])?
            {
                self.log(
                    Level::Fatal,
                    Some(&name),
                    "validate-scripts",
                    format!("a global validate hook refused package {:?}", name),
                );
            }
        }
        Ok(())
    }

    /// Topologically sort the plan so every package is unpacked after the
    /// packages it depends on.
    fn sort_packages(&mut self) -> Result<(), Error> {
        let mut listed = BTreeSet::new();
        let mut order = vec![];
        for idx in 0..self.packages.len() {
            if self.packages[idx].item_type().is_to_install() {
                self.sort_visit(idx, &mut listed, &mut order)?;
            }
        }
        self.plan = order;
        self.plan_position = 0;
        Ok(())
    }

    fn sort_visit(
        &self,
        idx: usize,
        listed: &mut BTreeSet<usize>,
        order: &mut Vec<usize>,
    ) -> Result<(), Error> {
        if !listed.insert(idx) {
            return Ok(());
        }
        if let Some(dependency) = self.packages[idx].dependency_field(fields::DEPENDS)? {
            for relation in &dependency.relations {
                for possibility in &relation.possibilities {
                    if let Some(dep_idx) = self.find_item_by_name(&possibility.name, |item| {
                        item.item_type().is_to_install()
                    }) {
                        self.sort_visit(dep_idx, listed, order)?;
                    }
                }
            }
        }
        order.push(idx);
        Ok(())
    }

    // ------------------------------------------------------------------
    // configuring / reconfiguring

    pub(super) fn validate_configuration(&mut self) -> Result<(), Error> {
        for input in std::mem::take(&mut self.inputs) {
            self.db.check_interrupt()?;
            if !is_package_name(&input) {
                self.log(
                    Level::Error,
                    None,
                    "validate-configuration",
                    format!(
                        "{:?} is not an installed package name; configuration works on names only",
                        input
                    ),
                );
                continue;
            }
            let status = self.db.package_status(&input)?;
            let acceptable = match self.mode {
                Mode::Configuring => matches!(
                    status,
                    PackageStatus::Unpacked | PackageStatus::HalfConfigured
                ),
                Mode::Reconfiguring => status == PackageStatus::Installed,
                _ => unreachable!(),
            };
            if !acceptable {
                self.log(
                    Level::Error,
                    Some(&input),
                    "validate-configuration",
                    format!(
                        "package {:?} is in state {} which does not permit this action",
                        input, status
                    ),
                );
                continue;
            }
            let control = self.db.control_file(&input)?;
            match PackageItem::from_installed(&input, control, status, PackageType::Configure) {
                Ok(item) => {
                    self.packages.push(item);
                    self.plan.push(self.packages.len() - 1);
                }
                Err(err) => {
                    self.log(
                        Level::Error,
                        Some(&input),
                        "validate-configuration",
                        format!("installed package {:?} has a bad record: {}", input, err),
                    );
                }
            }
        }
        self.plan_position = 0;
        Ok(())
    }
}

#[cfg(unix)]
pub(super) fn set_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|err| Error::Io(path.to_path_buf(), err))
}

#[cfg(not(unix))]
pub(super) fn set_executable(_path: &Path) -> Result<(), Error> {
    Ok(())
}

// vim: foldmethod=marker

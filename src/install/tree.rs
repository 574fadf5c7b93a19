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

//! Dependency resolution: conflict trimming, candidate search and the
//! enumeration of version-choice trees.
//!
//! A *tree* is one concrete assignment of a candidate version to every
//! package name the dependency search needs. When repositories offer more
//! than one version of a needed package, every combination is checked
//! (lazily, by indexing into the per-name candidate lists) and the valid
//! trees are ranked by version: a tree that installs newer versions wins;
//! two valid trees whose version preferences point in opposite directions
//! are rejected as ambiguous.

use super::item::PackageType;
use super::{Error, Force, Installer, Mode};
use crate::control::fields;
use crate::dependency::{Possibility, Relation};
use crate::output::Level;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// How one possibility fares against the packages already in the session
/// (explicit, upgrades, installed).
enum LocalMatch {
    /// A matching package at a matching version.
    Satisfied,

    /// The package is there but its version does not satisfy the
    /// constraint.
    VersionMismatch,

    /// No such package in the local set.
    NotFound,
}

/// One concrete choice of candidates: group name → item index.
type Assignment = BTreeMap<String, usize>;

impl Installer<'_> {
    /// Steps 7 through 12 of the validation pipeline: conflicts and
    /// breaks, the self-contained dependency check, repository loading,
    /// candidate trimming, tree enumeration and ranking.
    pub(super) fn validate_dependencies(&mut self) -> Result<(), Error> {
        let unsatisfied = self.unsatisfied_relations()?;
        if !unsatisfied.is_empty() {
            self.load_repositories()?;
        }
        self.check_conflicts_and_breaks()?;
        if unsatisfied.is_empty() {
            // everything is satisfied by the explicit set plus the
            // installed packages; no repository candidates are needed
            return Ok(());
        }
        self.resolve_candidates(unsatisfied)
    }

    fn dependency_field_names(&self, idx: usize) -> Vec<&'static str> {
        let mut ret = vec![fields::DEPENDS];
        if self.install_source && self.packages[idx].architecture().is_source() {
            ret.push(fields::BUILD_DEPENDS);
            ret.push(fields::BUILD_DEPENDS_ARCH);
            ret.push(fields::BUILD_DEPENDS_INDEP);
        }
        ret
    }

    /// How a single possibility fares against the local set. Names being
    /// installed or upgraded count with their *new* version; installed
    /// packages not touched by the plan count with the installed one.
    fn local_match(&self, possibility: &Possibility) -> LocalMatch {
        if let Some(idx) = self.find_item_by_name(&possibility.name, |item| {
            item.item_type().is_to_install()
        }) {
            return if possibility.version_matches(self.packages[idx].version()) {
                LocalMatch::Satisfied
            } else {
                LocalMatch::VersionMismatch
            };
        }
        if let Some(idx) = self.find_item_by_name(&possibility.name, |item| {
            matches!(
                item.item_type(),
                PackageType::Installed | PackageType::Unpacked
            )
        }) {
            return if possibility.version_matches(self.packages[idx].version()) {
                LocalMatch::Satisfied
            } else {
                LocalMatch::VersionMismatch
            };
        }
        // a virtual name only satisfies an unversioned possibility
        if possibility.version_constraint.is_none()
            && self
                .packages
                .iter()
                .any(|item| {
                    (item.item_type().is_to_install()
                        || matches!(
                            item.item_type(),
                            PackageType::Installed | PackageType::Unpacked
                        ))
                        && item.provides().iter().any(|name| name == &possibility.name)
                })
        {
            return LocalMatch::Satisfied;
        }
        LocalMatch::NotFound
    }

    /// Whether a relation is satisfied by the local set alone, honoring
    /// the depends-version force (which demotes a version mismatch).
    fn relation_satisfied_locally(&self, relation: &Relation) -> bool {
        let target = self.target_arch();
        let ignore_vendor = self.force(Force::Vendor);
        let mut version_mismatch = false;
        for possibility in &relation.possibilities {
            if !possibility.applies_to(target, ignore_vendor) {
                continue;
            }
            match self.local_match(possibility) {
                LocalMatch::Satisfied => return true,
                LocalMatch::VersionMismatch => version_mismatch = true,
                LocalMatch::NotFound => {}
            }
        }
        version_mismatch && self.force(Force::DependsVersion)
    }

    /// The self-contained dependency check: every relation of the
    /// explicit set that the explicit set plus the installed packages
    /// cannot satisfy. Self-cycles are rejected here.
    fn unsatisfied_relations(&mut self) -> Result<Vec<(usize, Relation)>, Error> {
        let mut ret = vec![];
        for idx in 0..self.packages.len() {
            if !self.packages[idx].item_type().is_to_install() {
                continue;
            }
            self.db.check_interrupt()?;
            let name = self.packages[idx].name().to_owned();
            for field in self.dependency_field_names(idx) {
                let Some(dependency) = self.packages[idx].dependency_field(field)? else {
                    continue;
                };
                for relation in &dependency.relations {
                    if relation
                        .possibilities
                        .iter()
                        .any(|possibility| possibility.name == name)
                    {
                        self.log(
                            Level::Error,
                            Some(&name),
                            "validate-dependencies",
                            format!("package {:?} depends on itself", name),
                        );
                        continue;
                    }
                    if !self.relation_satisfied_locally(relation) {
                        ret.push((idx, relation.clone()));
                    }
                }
            }
        }
        Ok(ret)
    }

    // ------------------------------------------------------------------
    // conflicts and breaks

    /// Check `Conflicts` and `Breaks` in both directions between the
    /// plan, the installed set and the repository candidates. Candidates
    /// are silently trimmed; conflicts with installed packages are
    /// demotable by their force; conflicts between two packages being
    /// installed never are. `Breaks` is ignored in unpacking mode.
    pub(super) fn check_conflicts_and_breaks(&mut self) -> Result<(), Error> {
        enum Action {
            Hard(String, String),
            Soft(Force, String, String),
            Trim(usize),
        }
        let target = self.target_arch().clone();
        let ignore_vendor = self.force(Force::Vendor);
        let mut actions = vec![];

        let field_specs: &[(&str, Force)] = if self.mode() == Mode::Unpacking {
            &[(fields::CONFLICTS, Force::Conflicts)]
        } else {
            &[
                (fields::CONFLICTS, Force::Conflicts),
                (fields::BREAKS, Force::Breaks),
            ]
        };

        for a_idx in 0..self.packages.len() {
            let a_type = self.packages[a_idx].item_type();
            let a_active = a_type.is_to_install()
                || matches!(a_type, PackageType::Installed | PackageType::Unpacked);
            if !a_active {
                continue;
            }
            self.db.check_interrupt()?;
            let a_replaced = matches!(
                a_type,
                PackageType::Installed | PackageType::Unpacked
            ) && self
                .find_item_by_name(self.packages[a_idx].name(), |item| {
                    item.item_type().is_to_install()
                })
                .is_some();
            if a_replaced {
                // the installed instance goes away; its relationships
                // are carried by the replacing item
                continue;
            }
            for (field, force) in field_specs {
                let Some(dependency) = self.packages[a_idx].dependency_field(field)? else {
                    continue;
                };
                for relation in &dependency.relations {
                    for possibility in &relation.possibilities {
                        if !possibility.applies_to(&target, ignore_vendor) {
                            continue;
                        }
                        for b_idx in 0..self.packages.len() {
                            if b_idx == a_idx {
                                continue;
                            }
                            let b = &self.packages[b_idx];
                            let named = b.name() == possibility.name
                                || (possibility.version_constraint.is_none()
                                    && b.provides().iter().any(|p| p == &possibility.name));
                            if !named || !possibility.version_matches(b.version()) {
                                continue;
                            }
                            let a = &self.packages[a_idx];
                            match b.item_type() {
                                t if t.is_to_install() => {
                                    if a.item_type().is_to_install() {
                                        actions.push(Action::Hard(
                                            a.name().to_owned(),
                                            format!(
                                                "packages {:?} and {:?} cannot be installed together ({}: {})",
                                                a.name(),
                                                b.name(),
                                                field,
                                                possibility
                                            ),
                                        ));
                                    } else {
                                        actions.push(Action::Soft(
                                            *force,
                                            a.name().to_owned(),
                                            format!(
                                                "installed package {:?} declares {} against {:?} {}",
                                                a.name(),
                                                field,
                                                b.name(),
                                                b.version()
                                            ),
                                        ));
                                    }
                                }
                                PackageType::Installed | PackageType::Unpacked => {
                                    let b_replaced = self
                                        .find_item_by_name(b.name(), |item| {
                                            item.item_type().is_to_install()
                                        })
                                        .is_some();
                                    if !b_replaced && a.item_type().is_to_install() {
                                        actions.push(Action::Soft(
                                            *force,
                                            a.name().to_owned(),
                                            format!(
                                                "package {:?} declares {} against installed package {:?} {}",
                                                a.name(),
                                                field,
                                                b.name(),
                                                b.version()
                                            ),
                                        ));
                                    }
                                }
                                PackageType::Available => {
                                    actions.push(Action::Trim(b_idx));
                                }
                                _ => {}
                            }
                        }
                    }
                }
            }
        }

        for action in actions {
            match action {
                Action::Hard(package, message) => {
                    // never demoted below an error; the conflicts force
                    // only adds a warning on top
                    if self.force(Force::Conflicts) {
                        self.log(
                            Level::Warning,
                            Some(&package),
                            "validate-conflicts",
                            "conflicts between packages being installed cannot be forced"
                                .to_owned(),
                        );
                    }
                    self.log(Level::Error, Some(&package), "validate-conflicts", message);
                }
                Action::Soft(force, package, message) => {
                    self.report(force, Some(&package), "validate-conflicts", message);
                }
                Action::Trim(idx) => {
                    let name = self.packages[idx].name().to_owned();
                    let version = self.packages[idx].version().to_string();
                    self.log(
                        Level::Debug,
                        Some(&name),
                        "validate-conflicts",
                        format!("candidate {} {} trimmed by a conflict", name, version),
                    );
                    self.packages[idx].set_type(PackageType::Invalid);
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // candidate search and tree enumeration

    /// Steps 10 through 12: mark usable repository candidates, enumerate
    /// the version-choice trees, rank them, and mark the winners as
    /// implicit installs.
    fn resolve_candidates(&mut self, unsatisfied: Vec<(usize, Relation)>) -> Result<(), Error> {
        let target = self.target_arch().clone();
        let ignore_vendor = self.force(Force::Vendor);

        // collect candidate groups by walking the dependency closure of
        // everything that still needs something
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut work: Vec<(usize, Relation)> = unsatisfied;
        let mut seen_items: BTreeSet<usize> = BTreeSet::new();

        while let Some((idx, relation)) = work.pop() {
            self.db.check_interrupt()?;
            let mut any_candidate = false;
            for possibility in &relation.possibilities {
                if !possibility.applies_to(&target, ignore_vendor) {
                    continue;
                }
                let mut candidates = vec![];
                for (a_idx, item) in self.packages.iter().enumerate() {
                    if item.item_type() == PackageType::Available
                        && item.name() == possibility.name
                        && possibility.version_matches(item.version())
                    {
                        candidates.push(a_idx);
                    }
                }
                if candidates.is_empty() {
                    continue;
                }
                any_candidate = true;
                let group = groups.entry(possibility.name.clone()).or_default();
                for candidate in candidates {
                    if !group.contains(&candidate) {
                        group.push(candidate);
                    }
                    // the candidate's own dependencies must be coverable
                    // too
                    if seen_items.insert(candidate) {
                        if let Some(dependency) =
                            self.packages[candidate].dependency_field(fields::DEPENDS)?
                        {
                            for relation in &dependency.relations {
                                if !self.relation_satisfied_locally(relation) {
                                    work.push((candidate, relation.clone()));
                                }
                            }
                        }
                    }
                }
            }
            if !any_candidate {
                let name = self.packages[idx].name().to_owned();
                self.report(
                    Force::Depends,
                    Some(&name),
                    "validate-dependencies",
                    format!(
                        "no installed package or repository candidate satisfies {:?} needed by {:?}",
                        relation.to_string(),
                        name
                    ),
                );
            }
        }

        if groups.is_empty() {
            return Ok(());
        }

        // lazy cartesian product over the per-name candidate lists
        let names: Vec<String> = groups.keys().cloned().collect();
        let sizes: Vec<usize> = names.iter().map(|name| groups[name].len()).collect();
        let total: usize = sizes.iter().product();
        self.log(
            Level::Debug,
            None,
            "validate-dependencies",
            format!(
                "{} candidate group(s), {} tree(s) to check",
                names.len(),
                total
            ),
        );

        let mut frontier: Vec<Assignment> = vec![];
        let mut cursor = vec![0usize; names.len()];
        loop {
            self.db.check_interrupt()?;
            let assignment: Assignment = names
                .iter()
                .zip(cursor.iter())
                .map(|(name, &i)| (name.clone(), groups[name][i]))
                .collect();

            if self.assignment_valid(&assignment)? {
                let mut dominated = false;
                frontier.retain(|kept| match self.compare_assignments(&assignment, kept) {
                    Some(Ordering::Greater) => false,
                    Some(Ordering::Less) | Some(Ordering::Equal) => {
                        dominated = true;
                        true
                    }
                    None => true,
                });
                if !dominated {
                    frontier.push(assignment);
                }
            }

            // increment the mixed-radix cursor
            let mut position = 0;
            loop {
                if position == cursor.len() {
                    break;
                }
                cursor[position] += 1;
                if cursor[position] < sizes[position] {
                    break;
                }
                cursor[position] = 0;
                position += 1;
            }
            if position == cursor.len() {
                break;
            }
        }

        if frontier.is_empty() {
            self.report(
                Force::Depends,
                None,
                "validate-dependencies",
                "no combination of repository candidates satisfies the dependencies".to_owned(),
            );
            return Ok(());
        }
        if frontier.len() > 1 {
            self.log(
                Level::Error,
                None,
                "validate-dependencies",
                format!(
                    "{} valid dependency trees disagree about which versions to prefer; refusing the ambiguity",
                    frontier.len()
                ),
            );
            return Ok(());
        }
        let winner = frontier.remove(0);
        self.apply_assignment(&winner)
    }

    /// Whether an assignment satisfies the whole dependency closure.
    fn assignment_valid(&self, assignment: &Assignment) -> Result<bool, Error> {
        let target = self.target_arch();
        let ignore_vendor = self.force(Force::Vendor);

        // held packages may not be replaced by a tree choice
        for (name, &idx) in assignment {
            if let Some(installed_idx) = self.find_item_by_name(name, |item| {
                matches!(
                    item.item_type(),
                    PackageType::Installed | PackageType::Unpacked
                )
            }) {
                if self.db.selection(name)? == crate::database::Selection::Hold
                    && self.packages[idx].version() != self.packages[installed_idx].version()
                    && !self.force(Force::Hold)
                {
                    return Ok(false);
                }
            }
        }

        let mut work: Vec<usize> = (0..self.packages.len())
            .filter(|&idx| self.packages[idx].item_type().is_to_install())
            .collect();
        let mut visited: BTreeSet<usize> = BTreeSet::new();
        while let Some(idx) = work.pop() {
            if !visited.insert(idx) {
                continue;
            }
            for field in self.dependency_field_names(idx) {
                let Some(dependency) = self.packages[idx].dependency_field(field)? else {
                    continue;
                };
                'relation: for relation in &dependency.relations {
                    if self.relation_satisfied_locally(relation) {
                        continue;
                    }
                    for possibility in &relation.possibilities {
                        if !possibility.applies_to(target, ignore_vendor) {
                            continue;
                        }
                        if let Some(&chosen) = assignment.get(&possibility.name) {
                            if possibility.version_matches(self.packages[chosen].version()) {
                                work.push(chosen);
                                continue 'relation;
                            }
                        }
                    }
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Compare two valid assignments by the versions they choose.
    /// `Greater` means `left` installs newer (or equal) versions overall;
    /// `None` means the preferences point in opposite directions.
    fn compare_assignments(&self, left: &Assignment, right: &Assignment) -> Option<Ordering> {
        let mut ordering = Ordering::Equal;
        for (name, &left_idx) in left {
            let Some(&right_idx) = right.get(name) else {
                continue;
            };
            let cmp = self.packages[left_idx]
                .version()
                .cmp(self.packages[right_idx].version());
            match (ordering, cmp) {
                (_, Ordering::Equal) => {}
                (Ordering::Equal, cmp) => ordering = cmp,
                (current, cmp) if current == cmp => {}
                _ => return None,
            }
        }
        Some(ordering)
    }

    /// Mark the winning tree: reachable candidates become implicit
    /// installs (implicit upgrades when they replace an installed
    /// version); candidates of the same name that lost with an older
    /// version are marked as such.
    fn apply_assignment(&mut self, assignment: &Assignment) -> Result<(), Error> {
        let target = self.target_arch().clone();
        let ignore_vendor = self.force(Force::Vendor);

        // reachability: only candidates the plan actually needs are
        // installed
        let mut chosen: BTreeSet<usize> = BTreeSet::new();
        let mut work: Vec<usize> = (0..self.packages.len())
            .filter(|&idx| self.packages[idx].item_type().is_to_install())
            .collect();
        let mut visited: BTreeSet<usize> = BTreeSet::new();
        while let Some(idx) = work.pop() {
            if !visited.insert(idx) {
                continue;
            }
            for field in self.dependency_field_names(idx) {
                let Some(dependency) = self.packages[idx].dependency_field(field)? else {
                    continue;
                };
                'relation: for relation in &dependency.relations {
                    if self.relation_satisfied_locally(relation) {
                        continue;
                    }
                    for possibility in &relation.possibilities {
                        if !possibility.applies_to(&target, ignore_vendor) {
                            continue;
                        }
                        if let Some(&candidate) = assignment.get(&possibility.name) {
                            if possibility.version_matches(self.packages[candidate].version()) {
                                if chosen.insert(candidate) {
                                    work.push(candidate);
                                }
                                continue 'relation;
                            }
                        }
                    }
                }
            }
        }

        for idx in chosen {
            let name = self.packages[idx].name().to_owned();
            let version = self.packages[idx].version().clone();
            let installed_idx = self.find_item_by_name(&name, |item| {
                matches!(
                    item.item_type(),
                    PackageType::Installed | PackageType::Unpacked
                )
            });
            match installed_idx {
                Some(installed_idx) => {
                    let installed_version = self.packages[installed_idx].version().clone();
                    if version < installed_version && !self.force(Force::Downgrade) {
                        self.report(
                            Force::Downgrade,
                            Some(&name),
                            "validate-dependencies",
                            format!(
                                "dependencies need {:?} {} but {} is installed and downgrades are not forced",
                                name, version, installed_version
                            ),
                        );
                        continue;
                    }
                    self.packages[idx].set_type(PackageType::UpgradeImplicit);
                    self.packages[idx].set_upgrade(Some(installed_idx));
                }
                None => {
                    self.packages[idx].set_type(PackageType::Implicit);
                }
            }
            self.log(
                Level::Info,
                Some(&name),
                "validate-dependencies",
                format!("package {:?} {} will be installed to satisfy dependencies", name, version),
            );

            // same-name candidates that lost with an older version
            for other in 0..self.packages.len() {
                if self.packages[other].item_type() == PackageType::Available
                    && self.packages[other].name() == name
                    && self.packages[other].version() < &version
                {
                    self.packages[other].set_type(PackageType::Older);
                }
            }
        }
        Ok(())
    }
}

// vim: foldmethod=marker

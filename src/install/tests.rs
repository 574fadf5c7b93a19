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

use super::{Error, Force, Installer, Step};
use crate::architecture::Architecture;
use crate::archive::DebBuilder;
use crate::control::{fields, ControlFile};
use crate::database::{Database, PackageStatus};
use crate::tracker::Tracker;
use crate::version::Version;
use std::path::{Path, PathBuf};

pub(crate) const TEST_ARCH: &str = "linux-amd64";

pub(crate) fn test_db(root: &Path) -> Database {
    let _ = env_logger::builder().is_test(true).try_init();
    let arch: Architecture = TEST_ARCH.parse().unwrap();
    Database::create(root, &arch).unwrap();
    Database::open(root).unwrap()
}

pub(crate) struct DebSpec<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub fields: &'a [(&'a str, &'a str)],
    pub files: &'a [(&'a str, &'a str)],
    pub conffiles: &'a [(&'a str, &'a str)],
    pub scripts: &'a [(&'a str, &'a str)],
}

impl Default for DebSpec<'_> {
    fn default() -> Self {
        DebSpec {
            name: "pkg",
            version: "1.0",
            fields: &[],
            files: &[],
            conffiles: &[],
            scripts: &[],
        }
    }
}

pub(crate) fn make_deb(dir: &Path, spec: &DebSpec<'_>) -> PathBuf {
    let mut ctrl = ControlFile::new();
    ctrl.set_field(fields::PACKAGE, spec.name);
    ctrl.set_field(fields::VERSION, spec.version);
    ctrl.set_field(fields::ARCHITECTURE, TEST_ARCH);
    for (key, value) in spec.fields {
        ctrl.set_field(key, *value);
    }
    let mut builder = DebBuilder::new(ctrl);
    for (path, content) in spec.files {
        builder = builder.install_file(path, content.as_bytes(), 0o644);
    }
    for (path, content) in spec.conffiles {
        builder = builder.install_conffile(path, content.as_bytes());
    }
    for (name, content) in spec.scripts {
        builder = builder.script(name, content.as_bytes());
    }
    let version: Version = spec.version.parse().unwrap();
    let path = dir.join(format!(
        "{}_{}_{}.deb",
        spec.name,
        version.to_filename_string(),
        TEST_ARCH
    ));
    builder.write_to(&path).unwrap();
    path
}

fn install_archive(db: &Database, archive: &Path) {
    let mut install = Installer::new(db);
    install.add_package(&archive.display().to_string());
    install.validate().unwrap();
    install.pre_configure().unwrap();
    while let Step::Item(idx) = install.unpack().unwrap() {
        install.configure(idx).unwrap();
    }
}

#[test]
fn install_fresh_package() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let deb = make_deb(
        dir.path(),
        &DebSpec {
            name: "hello",
            files: &[("usr/bin/hello", "#!/bin/sh\necho hello\n")],
            ..Default::default()
        },
    );

    let mut install = Installer::new(&db);
    install.add_package(&deb.display().to_string());
    install.validate().unwrap();
    install.pre_configure().unwrap();

    let list = install.install_list();
    assert_eq!(1, list.len());
    assert_eq!("hello", list[0].name);
    assert!(list[0].explicit);
    assert!(!list[0].is_upgrade);

    let Step::Item(idx) = install.unpack().unwrap() else {
        panic!("expected an item to unpack");
    };
    assert!(dir.path().join("usr/bin/hello").is_file());
    assert_eq!(PackageStatus::Unpacked, db.package_status("hello").unwrap());

    install.configure(idx).unwrap();
    assert_eq!(PackageStatus::Installed, db.package_status("hello").unwrap());
    assert_eq!(
        Some("yes".to_owned()),
        db.get_field("hello", fields::X_EXPLICIT).unwrap()
    );
    assert!(db
        .file_index("hello")
        .unwrap()
        .contains(Path::new("usr/bin/hello")));
    assert_eq!(Step::EndOfPlan, install.unpack().unwrap());
}

#[test]
fn install_with_implicit_dependency() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_deb(
        &repo,
        &DebSpec {
            name: "app",
            version: "1.0",
            fields: &[(fields::DEPENDS, "lib (>= 2.0)")],
            files: &[("usr/bin/app", "app\n")],
            ..Default::default()
        },
    );
    make_deb(
        &repo,
        &DebSpec {
            name: "lib",
            version: "2.1",
            files: &[("usr/lib/lib.so", "lib\n")],
            ..Default::default()
        },
    );

    let db = test_db(&dir.path().join("db"));
    let mut install = Installer::new(&db);
    install.add_repository(&repo);
    install.add_package("app");
    install.validate().unwrap();

    // the dependency comes first in the plan
    let list = install.install_list();
    assert_eq!(2, list.len());
    assert_eq!("lib", list[0].name);
    assert!(!list[0].explicit);
    assert_eq!("app", list[1].name);
    assert!(list[1].explicit);

    install.pre_configure().unwrap();
    while let Step::Item(idx) = install.unpack().unwrap() {
        install.configure(idx).unwrap();
    }
    assert_eq!(PackageStatus::Installed, db.package_status("app").unwrap());
    assert_eq!(PackageStatus::Installed, db.package_status("lib").unwrap());
    assert_eq!(
        Some("no".to_owned()),
        db.get_field("lib", fields::X_EXPLICIT).unwrap()
    );
    assert!(dir.path().join("usr/bin/app").is_file());
    assert!(dir.path().join("usr/lib/lib.so").is_file());
}

#[test]
fn implicit_dependency_prefers_newest_version() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    make_deb(
        &repo,
        &DebSpec {
            name: "app",
            fields: &[(fields::DEPENDS, "lib (>= 2.0)")],
            ..Default::default()
        },
    );
    make_deb(
        &repo,
        &DebSpec {
            name: "lib",
            version: "2.0",
            ..Default::default()
        },
    );
    make_deb(
        &repo,
        &DebSpec {
            name: "lib",
            version: "2.5",
            ..Default::default()
        },
    );

    let db = test_db(&dir.path().join("db"));
    let mut install = Installer::new(&db);
    install.add_repository(&repo);
    install.add_package("app");
    install.validate().unwrap();

    let list = install.install_list();
    let lib = list.iter().find(|entry| entry.name == "lib").unwrap();
    assert_eq!("2.5", lib.version.to_string());
}

#[test]
fn missing_dependency_fails_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let deb = make_deb(
        dir.path(),
        &DebSpec {
            name: "app",
            fields: &[(fields::DEPENDS, "nosuchlib")],
            ..Default::default()
        },
    );

    let mut install = Installer::new(&db);
    install.add_package(&deb.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));

    let mut install = Installer::new(&db);
    install.set_force(Force::Depends, true);
    install.add_package(&deb.display().to_string());
    install.validate().unwrap();
}

#[test]
fn conflicts_between_explicit_packages_cannot_be_forced() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let a = make_deb(
        dir.path(),
        &DebSpec {
            name: "aa",
            fields: &[(fields::CONFLICTS, "bb")],
            ..Default::default()
        },
    );
    let b = make_deb(
        dir.path(),
        &DebSpec {
            name: "bb",
            ..Default::default()
        },
    );

    let mut install = Installer::new(&db);
    install.add_package(&a.display().to_string());
    install.add_package(&b.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));

    // the conflicts force does not demote conflicts inside the explicit
    // set
    let mut install = Installer::new(&db);
    install.set_force(Force::Conflicts, true);
    install.add_package(&a.display().to_string());
    install.add_package(&b.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));
}

#[test]
fn conflict_with_installed_package_is_demotable() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let b = make_deb(
        dir.path(),
        &DebSpec {
            name: "bb",
            ..Default::default()
        },
    );
    install_archive(&db, &b);

    let a = make_deb(
        dir.path(),
        &DebSpec {
            name: "aa",
            fields: &[(fields::CONFLICTS, "bb")],
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&a.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));

    let mut install = Installer::new(&db);
    install.set_force(Force::Conflicts, true);
    install.add_package(&a.display().to_string());
    install.validate().unwrap();
}

#[test]
fn upgrade_replaces_files_and_deletes_obsolete_ones() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let v1 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "1.0",
            files: &[("usr/bin/tool", "one\n"), ("usr/share/tool/old", "old\n")],
            ..Default::default()
        },
    );
    install_archive(&db, &v1);
    assert!(dir.path().join("usr/share/tool/old").is_file());

    let v2 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "2.0",
            files: &[("usr/bin/tool", "two\n"), ("usr/share/tool/new", "new\n")],
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&v2.display().to_string());
    install.validate().unwrap();
    let list = install.install_list();
    assert!(list[0].is_upgrade);
    while let Step::Item(idx) = install.unpack().unwrap() {
        install.configure(idx).unwrap();
    }

    assert_eq!(
        "two\n",
        std::fs::read_to_string(dir.path().join("usr/bin/tool")).unwrap()
    );
    assert!(dir.path().join("usr/share/tool/new").is_file());
    // the file only the old version owned is gone
    assert!(!dir.path().join("usr/share/tool/old").exists());
    assert_eq!(
        Some("2.0".to_owned()),
        db.get_field("tool", fields::VERSION).unwrap()
    );
}

#[test]
fn downgrade_requires_the_force() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let v2 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "2.0",
            ..Default::default()
        },
    );
    install_archive(&db, &v2);

    let v1 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "1.0",
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&v1.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));

    let mut install = Installer::new(&db);
    install.set_force(Force::Downgrade, true);
    install.add_package(&v1.display().to_string());
    install.validate().unwrap();
    while let Step::Item(idx) = install.unpack().unwrap() {
        install.configure(idx).unwrap();
    }
    assert_eq!(
        Some("1.0".to_owned()),
        db.get_field("tool", fields::VERSION).unwrap()
    );
}

#[test]
fn held_packages_require_the_force() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let v1 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "1.0",
            ..Default::default()
        },
    );
    install_archive(&db, &v1);
    db.set_field("tool", fields::X_SELECTION, "hold").unwrap();

    let v2 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "2.0",
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&v2.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));

    let mut install = Installer::new(&db);
    install.set_force(Force::Hold, true);
    install.add_package(&v2.display().to_string());
    install.validate().unwrap();
}

#[test]
fn upgrade_keeps_modified_conffile() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let conffile = dir.path().join("etc/tool.conf");

    let v1 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "1.0",
            conffiles: &[("etc/tool.conf", "setting = 1\n")],
            ..Default::default()
        },
    );
    install_archive(&db, &v1);
    assert_eq!(
        "setting = 1\n",
        std::fs::read_to_string(&conffile).unwrap()
    );

    // the administrator edits the configuration
    std::fs::write(&conffile, "setting = edited\n").unwrap();

    let v2 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "2.0",
            conffiles: &[("etc/tool.conf", "setting = 2\n")],
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&v2.display().to_string());
    install.validate().unwrap();
    let Step::Item(idx) = install.unpack().unwrap() else {
        panic!("expected the upgrade to unpack");
    };
    // the new conffile went next to the modified one
    assert!(dir.path().join("etc/tool.conf.wpkg-new").is_file());
    install.configure(idx).unwrap();

    // the user edit survived, the new version stays parked
    assert_eq!(
        "setting = edited\n",
        std::fs::read_to_string(&conffile).unwrap()
    );
    assert_eq!(
        "setting = 2\n",
        std::fs::read_to_string(dir.path().join("etc/tool.conf.wpkg-new")).unwrap()
    );
}

#[test]
fn upgrade_replaces_pristine_conffile() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let conffile = dir.path().join("etc/tool.conf");

    let v1 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "1.0",
            conffiles: &[("etc/tool.conf", "setting = 1\n")],
            ..Default::default()
        },
    );
    install_archive(&db, &v1);

    let v2 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "2.0",
            conffiles: &[("etc/tool.conf", "setting = 2\n")],
            ..Default::default()
        },
    );
    install_archive(&db, &v2);

    assert_eq!(
        "setting = 2\n",
        std::fs::read_to_string(&conffile).unwrap()
    );
    assert_eq!(
        "setting = 1\n",
        std::fs::read_to_string(dir.path().join("etc/tool.conf.wpkg-old")).unwrap()
    );
    assert!(!dir.path().join("etc/tool.conf.wpkg-new").exists());
}

#[test]
fn overlapping_plan_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let a = make_deb(
        dir.path(),
        &DebSpec {
            name: "aa",
            files: &[("usr/share/common", "a\n")],
            ..Default::default()
        },
    );
    let b = make_deb(
        dir.path(),
        &DebSpec {
            name: "bb",
            files: &[("usr/share/common", "b\n")],
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&a.display().to_string());
    install.add_package(&b.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));
}

#[test]
fn essential_files_are_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let essential = make_deb(
        dir.path(),
        &DebSpec {
            name: "base",
            fields: &[(fields::ESSENTIAL, "yes")],
            files: &[("usr/bin/base", "base\n")],
            ..Default::default()
        },
    );
    install_archive(&db, &essential);

    let intruder = make_deb(
        dir.path(),
        &DebSpec {
            name: "intruder",
            files: &[("usr/bin/base", "intruder\n")],
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.set_force(Force::Overwrite, true);
    install.set_force(Force::OverwriteDir, true);
    install.add_package(&intruder.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));
}

#[test]
fn wrong_architecture_is_demotable() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));

    let mut ctrl = ControlFile::new();
    ctrl.set_field(fields::PACKAGE, "alien");
    ctrl.set_field(fields::VERSION, "1.0");
    ctrl.set_field(fields::ARCHITECTURE, "linux-arm64");
    let deb = dir.path().join("alien_1.0_linux-arm64.deb");
    DebBuilder::new(ctrl).write_to(&deb).unwrap();

    let mut install = Installer::new(&db);
    install.add_package(&deb.display().to_string());
    assert!(matches!(
        install.validate(),
        Err(Error::ValidationFailed(_))
    ));

    let mut install = Installer::new(&db);
    install.set_force(Force::Architecture, true);
    install.add_package(&deb.display().to_string());
    install.validate().unwrap();
}

#[cfg(unix)]
#[test]
fn failed_unpack_restores_and_journal_replays() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let journal = dir.path().join("journal");
    db.attach_tracker(Tracker::new(&journal).unwrap());

    let good = make_deb(
        dir.path(),
        &DebSpec {
            name: "good",
            files: &[("usr/bin/good", "good\n")],
            ..Default::default()
        },
    );
    let bad = make_deb(
        dir.path(),
        &DebSpec {
            name: "bad",
            files: &[("usr/bin/bad", "bad\n")],
            scripts: &[("preinst", "#!/bin/sh\nexit 1\n")],
            ..Default::default()
        },
    );

    let mut install = Installer::new(&db);
    install.add_package(&good.display().to_string());
    install.validate().unwrap();
    while let Step::Item(idx) = install.unpack().unwrap() {
        install.configure(idx).unwrap();
    }
    assert!(dir.path().join("usr/bin/good").is_file());

    let mut install = Installer::new(&db);
    install.add_package(&bad.display().to_string());
    install.validate().unwrap();
    let err = install.unpack();
    assert!(matches!(err, Err(Error::ScriptFailed { .. })), "{:?}", err);
    // the failed package never made it in
    assert_eq!(PackageStatus::NotInstalled, db.package_status("bad").unwrap());
    assert!(!dir.path().join("usr/bin/bad").exists());

    let tracker = db.detach_tracker().unwrap();
    tracker.track_failure().unwrap();
    let text = std::fs::read_to_string(&journal).unwrap();
    assert!(text.contains("purge good"), "journal was: {text:?}");
    assert!(text.ends_with("failed\n"), "journal was: {text:?}");

    // replaying the journal purges the package that did get installed
    tracker.rollback(&db).unwrap();
    assert_eq!(
        PackageStatus::NotInstalled,
        db.package_status("good").unwrap()
    );
    assert!(!dir.path().join("usr/bin/good").exists());
    assert!(!journal.exists());
}

#[cfg(unix)]
#[test]
fn failing_preinst_on_upgrade_restores_the_old_state() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let v1 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "1.0",
            files: &[("usr/bin/tool", "one\n")],
            ..Default::default()
        },
    );
    install_archive(&db, &v1);

    let v2 = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            version: "2.0",
            files: &[("usr/bin/tool", "two\n")],
            scripts: &[("preinst", "#!/bin/sh\nexit 1\n")],
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&v2.display().to_string());
    install.validate().unwrap();
    assert!(install.unpack().is_err());

    assert_eq!(
        "one\n",
        std::fs::read_to_string(dir.path().join("usr/bin/tool")).unwrap()
    );
    assert_eq!(
        Some("1.0".to_owned()),
        db.get_field("tool", fields::VERSION).unwrap()
    );
    assert_eq!(
        PackageStatus::Installed,
        db.package_status("tool").unwrap()
    );
}

#[test]
fn pre_configure_configures_unpacked_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let lib = make_deb(
        dir.path(),
        &DebSpec {
            name: "lib",
            version: "2.0",
            ..Default::default()
        },
    );

    // unpack the library without configuring it
    let mut install = Installer::new(&db);
    install.set_unpacking();
    install.add_package(&lib.display().to_string());
    install.validate().unwrap();
    while let Step::Item(_) = install.unpack().unwrap() {}
    assert_eq!(PackageStatus::Unpacked, db.package_status("lib").unwrap());

    let app = make_deb(
        dir.path(),
        &DebSpec {
            name: "app",
            fields: &[(fields::DEPENDS, "lib (>= 2.0)")],
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.add_package(&app.display().to_string());
    install.validate().unwrap();
    install.pre_configure().unwrap();
    assert_eq!(PackageStatus::Installed, db.package_status("lib").unwrap());
}

#[test]
fn configure_mode_configures_unpacked_packages() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let deb = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            ..Default::default()
        },
    );
    let mut install = Installer::new(&db);
    install.set_unpacking();
    install.add_package(&deb.display().to_string());
    install.validate().unwrap();
    while let Step::Item(_) = install.unpack().unwrap() {}

    let mut configure = Installer::new(&db);
    configure.set_configuring();
    configure.add_package("tool");
    configure.validate().unwrap();
    for idx in 0..configure.count() {
        configure.configure(idx).unwrap();
    }
    assert_eq!(PackageStatus::Installed, db.package_status("tool").unwrap());

    // configuring something that is not unpacked is refused
    let mut configure = Installer::new(&db);
    configure.set_configuring();
    configure.add_package("tool");
    assert!(matches!(
        configure.validate(),
        Err(Error::ValidationFailed(_))
    ));
}

#[test]
fn reconfigure_reextracts_conffiles() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let deb = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            conffiles: &[("etc/tool.conf", "setting = 1\n")],
            ..Default::default()
        },
    );
    install_archive(&db, &deb);

    // the configuration was edited and reconfigure must not clobber it
    let conffile = dir.path().join("etc/tool.conf");
    std::fs::write(&conffile, "setting = edited\n").unwrap();

    let mut install = Installer::new(&db);
    install.set_reconfiguring();
    install.add_package("tool");
    install.validate().unwrap();
    let Step::Item(_) = install.step().unwrap() else {
        panic!("expected the package to reconfigure");
    };
    assert_eq!(Step::EndOfPlan, install.step().unwrap());

    assert_eq!(
        "setting = edited\n",
        std::fs::read_to_string(&conffile).unwrap()
    );
    assert_eq!(
        "setting = 1\n",
        std::fs::read_to_string(dir.path().join("etc/tool.conf.wpkg-new")).unwrap()
    );
    assert_eq!(PackageStatus::Installed, db.package_status("tool").unwrap());
}

#[test]
fn skip_same_version_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db(&dir.path().join("db"));
    let deb = make_deb(
        dir.path(),
        &DebSpec {
            name: "tool",
            ..Default::default()
        },
    );
    install_archive(&db, &deb);

    let mut install = Installer::new(&db);
    install.set_force(Force::SkipSameVersion, true);
    install.add_package(&deb.display().to_string());
    install.validate().unwrap();
    assert!(install.install_list().is_empty());
    assert_eq!(Step::EndOfPlan, install.unpack().unwrap());
}

// vim: foldmethod=marker

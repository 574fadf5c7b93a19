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

//! The `tracker` module implements the rollback journal.
//!
//! Before a session performs a destructive step it appends the *inverse*
//! instruction to the journal: installing `foo` appends `purge foo`,
//! upgrading appends `downgrade foo_1.0.deb`, removing appends
//! `install foo_1.0.deb`, configuring appends `deconfigure foo`, and so
//! on. The file is reopened, written and closed for every instruction, so
//! a crash at any point leaves a prefix of the journal that is still a
//! valid rollback plan.
//!
//! [Tracker::rollback] reads the whole journal, parses every line into a
//! command, and executes the commands in *reverse* order through the
//! installer and remover. A `failed` line marks the point of failure;
//! collection stops there. Blank lines and `#` comments are skipped.
//! Instruction arguments containing whitespace are double-quoted (see
//! [quote_arg]).
//!
//! Call [Tracker::commit] once the session succeeded to disarm the
//! journal. By default the journal file is deleted once rollback (or a
//! commit) is through; [Tracker::keep_file] keeps it for forensics.

use crate::database::Database;
use crate::install::{Force as InstallForce, Installer, Step};
use crate::output::Level;
use crate::remove::{Force as RemoveForce, Remover};
use std::cell::Cell;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Error conditions which may be encountered appending to or replaying a
/// journal.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The journal filename is empty.
    EmptyFilename,

    /// An underlying I/O operation failed on the given path.
    Io(PathBuf, std::io::Error),

    /// A journal line holds a command without its parameters.
    MissingParameters {
        /// Line number, starting at 1.
        line: usize,
        /// The offending line.
        command: String,
    },

    /// A journal line holds a command this version does not know.
    UnknownCommand {
        /// Line number, starting at 1.
        line: usize,
        /// The offending command word.
        command: String,
    },
}
crate::errors::error_enum!(Error);

/// Double-quote an instruction argument when it contains whitespace.
pub fn quote_arg(arg: &str) -> String {
    if arg.chars().any(|ch| ch.is_whitespace()) {
        format!("\"{}\"", arg)
    } else {
        arg.to_owned()
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Command {
    line: usize,
    name: String,
    params: Vec<String>,
}

fn split_params(text: &str) -> Vec<String> {
    let mut params = vec![];
    let mut chars = text.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(ch) if ch.is_whitespace()) {
            chars.next();
        }
        let Some(&ch) = chars.peek() else {
            break;
        };
        let mut param = String::new();
        if ch == '"' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                param.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                param.push(ch);
                chars.next();
            }
        }
        params.push(param);
    }
    params
}

/// The rollback journal of one session.
pub struct Tracker {
    filename: PathBuf,
    committed: Cell<bool>,
    keep: Cell<bool>,
}

impl Tracker {
    /// Create a tracker around the given journal file. The file itself is
    /// only created by the first [Tracker::track] call.
    pub fn new(filename: &Path) -> Result<Self, Error> {
        if filename.as_os_str().is_empty() {
            return Err(Error::EmptyFilename);
        }
        Ok(Tracker {
            filename: filename.to_path_buf(),
            committed: Cell::new(false),
            keep: Cell::new(false),
        })
    }

    /// The journal filename.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Disarm the journal: a later [Tracker::rollback] becomes a no-op
    /// (apart from deleting the file).
    pub fn commit(&self) {
        self.committed.set(true);
    }

    /// Keep the journal file around instead of deleting it at the end of
    /// [Tracker::rollback].
    pub fn keep_file(&self, keep: bool) {
        self.keep.set(keep);
    }

    /// Append one instruction to the journal.
    ///
    /// The file is reopened in append mode, written, and closed again on
    /// purpose: the instruction must be on disk *before* the step it
    /// undoes is performed, or a crash could leave an action with no
    /// recorded inverse.
    pub fn track(&self, command: &str) -> Result<(), Error> {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.filename)
            .map_err(|err| Error::Io(self.filename.clone(), err))?;
        writeln!(file, "{}", command.trim_end_matches('\n'))
            .map_err(|err| Error::Io(self.filename.clone(), err))
    }

    /// Mark the point of failure. Replay stops when it reaches this line,
    /// so instructions recorded after a `failed` marker are never run.
    pub fn track_failure(&self) -> Result<(), Error> {
        self.track("failed")
    }

    fn parse(&self) -> Result<Vec<Command>, Error> {
        let text = match std::fs::read_to_string(&self.filename) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                // nothing was ever tracked
                return Ok(vec![]);
            }
            Err(err) => return Err(Error::Io(self.filename.clone(), err)),
        };
        let mut commands = vec![];
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, rest) = match line.split_once(' ') {
                Some((name, rest)) => (name, rest),
                None => (line, ""),
            };
            if name == "failed" {
                // the process stopped here; nothing after this line was
                // performed
                break;
            }
            let params = split_params(rest);
            if params.is_empty() {
                return Err(Error::MissingParameters {
                    line: line_no,
                    command: line.to_owned(),
                });
            }
            match name {
                "configure" | "deconfigure" | "downgrade" | "install" | "purge" | "unpack" => {}
                _ => {
                    return Err(Error::UnknownCommand {
                        line: line_no,
                        command: name.to_owned(),
                    });
                }
            }
            commands.push(Command {
                line: line_no,
                name: name.to_owned(),
                params,
            });
        }
        Ok(commands)
    }

    /// Replay the journal in reverse, restoring the database to its
    /// pre-session state.
    ///
    /// Each command is interpreted by running the installer or remover
    /// with the appropriate forces. A command whose replay fails is
    /// logged and the replay continues with the remaining commands, the
    /// way a shell script without `-e` would. Afterwards the journal file
    /// is deleted unless [Tracker::keep_file] asked otherwise.
    pub fn rollback(&self, db: &Database) -> Result<(), Error> {
        if !self.committed.get() {
            let commands = self.parse()?;
            for command in commands.iter().rev() {
                if let Err(err) = db.check_interrupt() {
                    db.output().log(
                        Level::Error,
                        "tracker",
                        None,
                        "rollback",
                        format!("rollback interrupted: {}", err),
                    );
                    break;
                }
                command.run(db, &self.filename);
            }
        }

        if !self.keep.get() && self.filename.exists() {
            std::fs::remove_file(&self.filename)
                .map_err(|err| Error::Io(self.filename.clone(), err))?;
        }
        Ok(())
    }
}

impl Command {
    fn run(&self, db: &Database, journal: &Path) {
        let result = match self.name.as_str() {
            "configure" => self.run_configure(db),
            "deconfigure" => self.run_deconfigure(db),
            "downgrade" => self.run_install(db, true, true),
            "install" => self.run_install(db, false, true),
            "unpack" => self.run_install(db, false, false),
            "purge" => self.run_purge(db),
            _ => unreachable!(),
        };
        if let Err(message) = result {
            db.output().log(
                Level::Error,
                "tracker",
                None,
                "rollback",
                format!(
                    "{}:{}: command {:?} could not be replayed: {}",
                    journal.display(),
                    self.line,
                    self.name,
                    message
                ),
            );
        }
    }

    /// Configure an unpacked package again.
    fn run_configure(&self, db: &Database) -> Result<(), String> {
        let mut install = Installer::new(db);
        install.set_configuring();
        install.add_package(&self.params[0]);
        install.validate().map_err(|e| e.to_string())?;
        for idx in 0..install.count() {
            install.configure(idx).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Deconfigure a configured package. Essential packages are forced
    /// through; nothing can be done about `required` ones here.
    fn run_deconfigure(&self, db: &Database) -> Result<(), String> {
        let mut remove = Remover::new(db);
        remove.set_deconfiguring();
        remove.set_force(RemoveForce::RemoveEssentials, true);
        remove.add_package(&self.params[0]);
        remove.validate().map_err(|e| e.to_string())?;
        for idx in 0..remove.count() {
            remove.deconfigure(idx).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Re-install (or downgrade back to, or re-unpack) an archive.
    fn run_install(&self, db: &Database, downgrade: bool, configure: bool) -> Result<(), String> {
        let mut install = Installer::new(db);
        install.set_installing();
        install.set_force(InstallForce::FileInfo, true);
        install.set_force(InstallForce::QuietFileInfo, true);
        install.set_force(InstallForce::Recursive, true);
        if downgrade {
            install.set_force(InstallForce::Downgrade, true);
        }
        install.add_package(&self.params[0]);
        install.validate().map_err(|e| e.to_string())?;
        install.pre_configure().map_err(|e| e.to_string())?;
        loop {
            match install.unpack().map_err(|e| e.to_string())? {
                Step::Item(idx) => {
                    if configure {
                        install.configure(idx).map_err(|e| e.to_string())?;
                    }
                }
                Step::EndOfPlan => return Ok(()),
            }
        }
    }

    /// Purge a package, configuration files included.
    fn run_purge(&self, db: &Database) -> Result<(), String> {
        let mut remove = Remover::new(db);
        remove.set_purging();
        remove.set_force(RemoveForce::RemoveEssentials, true);
        remove.add_package(&self.params[0]);
        remove.validate().map_err(|e| e.to_string())?;
        loop {
            match remove.remove().map_err(|e| e.to_string())? {
                Step::Item(idx) => {
                    remove.deconfigure(idx).map_err(|e| e.to_string())?;
                }
                Step::EndOfPlan => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!("foo", quote_arg("foo"));
        assert_eq!("\"a b\"", quote_arg("a b"));
    }

    #[test]
    fn split_quoted_params() {
        assert_eq!(
            vec!["a".to_owned(), "b c".to_owned(), "d".to_owned()],
            split_params("a \"b c\"  d")
        );
        assert!(split_params("  ").is_empty());
    }

    #[test]
    fn journal_is_a_prefix_log() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("journal");
        let tracker = Tracker::new(&journal).unwrap();
        tracker.track("purge foo").unwrap();
        tracker.track("deconfigure bar").unwrap();
        tracker.track_failure().unwrap();
        tracker.track("purge baz").unwrap();

        let commands = tracker.parse().unwrap();
        // collection stops at the failure marker
        assert_eq!(2, commands.len());
        assert_eq!("purge", commands[0].name);
        assert_eq!(vec!["foo".to_owned()], commands[0].params);
        assert_eq!("deconfigure", commands[1].name);
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("journal");
        std::fs::write(&journal, "# a comment\n\npurge foo\n").unwrap();
        let tracker = Tracker::new(&journal).unwrap();
        assert_eq!(1, tracker.parse().unwrap().len());
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("journal");
        let tracker = Tracker::new(&journal).unwrap();

        std::fs::write(&journal, "purge\n").unwrap();
        assert!(matches!(
            tracker.parse(),
            Err(Error::MissingParameters { line: 1, .. })
        ));

        std::fs::write(&journal, "frobnicate foo\n").unwrap();
        assert!(matches!(
            tracker.parse(),
            Err(Error::UnknownCommand { line: 1, .. })
        ));
    }

    #[test]
    fn empty_filename_is_rejected() {
        assert!(matches!(
            Tracker::new(Path::new("")),
            Err(Error::EmptyFilename)
        ));
    }

    #[test]
    fn missing_journal_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::new(&dir.path().join("journal")).unwrap();
        assert!(tracker.parse().unwrap().is_empty());
    }
}

// vim: foldmethod=marker

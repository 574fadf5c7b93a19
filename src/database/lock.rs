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
use std::io::Write;
use std::path::{Path, PathBuf};

/// The advisory lock guarding a database.
///
/// The lock is a file created with create-new semantics: whoever manages
/// to create it owns the database for the lifetime of the session, and a
/// second acquisition fails fast rather than waiting. The file holds the
/// owning pid and the session kind for a human to look at when a lock is
/// found lying around.
///
/// The lock file is removed again when the [Lock] is dropped, on every
/// exit path.
#[derive(Debug)]
pub(super) struct Lock {
    path: PathBuf,
}

impl Lock {
    pub(super) fn acquire(path: &Path, session: &str) -> Result<Self, Error> {
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Error::Locked(path.to_path_buf()));
            }
            Err(err) => return Err(Error::Io(path.to_path_buf(), err)),
        };
        writeln!(file, "{}\n{}", std::process::id(), session)
            .map_err(|err| Error::Io(path.to_path_buf(), err))?;
        Ok(Lock {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        // nothing useful can be done about a failure here
        let _ = std::fs::remove_file(&self.path);
    }
}

// vim: foldmethod=marker

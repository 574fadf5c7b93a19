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

use super::{DataEntry, EntryKind, Error};
use crate::control::ControlFile;
use flate2::{write::GzEncoder, Compression};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// A builder for binary package files.
///
/// The repository tooling and the test suites use this to author packages;
/// the installer only ever reads them back through
/// [crate::archive::DebReader].
pub struct DebBuilder {
    control: ControlFile,
    conffiles: Vec<String>,
    scripts: BTreeMap<String, Vec<u8>>,
    entries: Vec<DataEntry>,
    mtime: u64,
}

impl DebBuilder {
    /// Construct a new builder around a control file. The control file
    /// should carry at least `Package`, `Version` and `Architecture`.
    pub fn new(control: ControlFile) -> Self {
        let mtime = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|v| v.as_secs())
            .unwrap_or(0);
        DebBuilder {
            control,
            conffiles: vec![],
            scripts: BTreeMap::new(),
            entries: vec![],
            mtime,
        }
    }

    /// Use a fixed modification time on every archive member, making the
    /// output deterministic.
    pub fn set_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Register a regular file. Paths are relative to the installation
    /// root, e.g. `usr/bin/myapp`.
    pub fn install_file(mut self, path: impl AsRef<Path>, content: &[u8], mode: u32) -> Self {
        self.entries.push(DataEntry {
            path: path.as_ref().to_path_buf(),
            kind: EntryKind::File,
            mode,
            owner: "root".to_owned(),
            group: "root".to_owned(),
            size: content.len() as u64,
            mtime: self.mtime,
            content: content.to_vec(),
        });
        self
    }

    /// Register a directory.
    pub fn install_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.entries.push(DataEntry {
            path: path.as_ref().to_path_buf(),
            kind: EntryKind::Directory,
            mode: 0o755,
            owner: "root".to_owned(),
            group: "root".to_owned(),
            size: 0,
            mtime: self.mtime,
            content: vec![],
        });
        self
    }

    /// Register a symbolic link.
    pub fn install_symlink(mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        self.entries.push(DataEntry {
            path: path.as_ref().to_path_buf(),
            kind: EntryKind::Symlink {
                target: target.as_ref().to_path_buf(),
            },
            mode: 0o777,
            owner: "root".to_owned(),
            group: "root".to_owned(),
            size: 0,
            mtime: self.mtime,
            content: vec![],
        });
        self
    }

    /// Register a configuration file: installed like a regular file, and
    /// listed in the `conffiles` member.
    pub fn install_conffile(self, path: impl AsRef<Path>, content: &[u8]) -> Self {
        let name = format!("/{}", path.as_ref().display());
        let mut ret = self.install_file(path, content, 0o644);
        ret.conffiles.push(name);
        ret
    }

    /// Attach a maintenance script (`preinst`, `postinst`, `prerm`,
    /// `postrm` or `validate`).
    pub fn script(mut self, name: &str, content: &[u8]) -> Self {
        self.scripts.insert(name.to_owned(), content.to_vec());
        self
    }

    fn tar_header(&self, size: u64, mode: u32) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(self.mtime);
        header.set_size(size);
        header.set_mode(mode);
        header
    }

    fn control_tar(&self) -> Result<Vec<u8>, Error> {
        let mut builder = tar::Builder::new(Vec::new());

        let control = self.control.to_string().into_bytes();
        let mut header = self.tar_header(control.len() as u64, 0o644);
        builder.append_data(&mut header, "control", &control[..])?;

        if !self.conffiles.is_empty() {
            let mut conffiles = self.conffiles.join("\n");
            conffiles.push('\n');
            let conffiles = conffiles.into_bytes();
            let mut header = self.tar_header(conffiles.len() as u64, 0o644);
            builder.append_data(&mut header, "conffiles", &conffiles[..])?;
        }

        let mut md5sums = String::new();
        for entry in &self.entries {
            if entry.kind == EntryKind::File {
                let digest = Md5::digest(&entry.content);
                md5sums.push_str(&format!(
                    "{}  {}\n",
                    hex::encode(digest),
                    entry.path.display()
                ));
            }
        }
        if !md5sums.is_empty() {
            let md5sums = md5sums.into_bytes();
            let mut header = self.tar_header(md5sums.len() as u64, 0o644);
            builder.append_data(&mut header, "md5sums", &md5sums[..])?;
        }

        for (name, content) in &self.scripts {
            let mut header = self.tar_header(content.len() as u64, 0o755);
            builder.append_data(&mut header, name, &content[..])?;
        }

        Ok(builder.into_inner()?)
    }

    fn data_tar(&self) -> Result<Vec<u8>, Error> {
        let mut builder = tar::Builder::new(Vec::new());
        for entry in &self.entries {
            match &entry.kind {
                EntryKind::File => {
                    let mut header = self.tar_header(entry.size, entry.mode);
                    builder.append_data(&mut header, &entry.path, &entry.content[..])?;
                }
                EntryKind::Directory => {
                    let mut header = self.tar_header(0, entry.mode);
                    header.set_entry_type(tar::EntryType::Directory);
                    builder.append_data(&mut header, &entry.path, &[][..])?;
                }
                EntryKind::Symlink { target } => {
                    let mut header = self.tar_header(0, entry.mode);
                    header.set_entry_type(tar::EntryType::Symlink);
                    builder.append_link(&mut header, &entry.path, target)?;
                }
                EntryKind::Other => {}
            }
        }
        Ok(builder.into_inner()?)
    }

    /// Build the package in memory.
    pub fn build(&self) -> Result<Vec<u8>, Error> {
        let mut out = vec![];
        let mut ar_builder = ar::Builder::new(&mut out);

        let data: &[u8] = b"2.0\n";
        let mut header = ar::Header::new(b"debian-binary".to_vec(), data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(self.mtime);
        ar_builder.append(&header, data)?;

        let mut control_tar = GzEncoder::new(Vec::new(), Compression::default());
        control_tar.write_all(&self.control_tar()?)?;
        let control_tar = control_tar.finish()?;
        let mut header = ar::Header::new(b"control.tar.gz".to_vec(), control_tar.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(self.mtime);
        ar_builder.append(&header, &control_tar[..])?;

        let mut data_tar = GzEncoder::new(Vec::new(), Compression::default());
        data_tar.write_all(&self.data_tar()?)?;
        let data_tar = data_tar.finish()?;
        let mut header = ar::Header::new(b"data.tar.gz".to_vec(), data_tar.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(self.mtime);
        ar_builder.append(&header, &data_tar[..])?;

        drop(ar_builder);
        Ok(out)
    }

    /// Build the package and write it to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), Error> {
        Ok(std::fs::write(path, self.build()?)?)
    }
}

// vim: foldmethod=marker

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

#![deny(missing_docs)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]

//! The `wpkg` crate is the core of a Debian-style package installer: it
//! takes a set of requested package operations (install, unpack,
//! configure, reconfigure, remove, purge, deconfigure) and turns them,
//! via dependency resolution and transactional application, into a
//! consistent change of an on-disk database of installed packages.
//!
//! # A tour of the crate
//!
//! The parsing layers come first. [version] implements the package
//! version syntax and its total ordering (epochs, the tilde rule,
//! canonicalization); [dependency] parses dependency fields (`Depends`,
//! `Conflicts`, ... with alternatives, version constraints and
//! architecture masks); [architecture] understands architecture tuples
//! and patterns; [control] reads and writes the RFC 2822-style paragraph
//! format everything is stored in.
//!
//! The [archive] module decodes and builds the binary package files
//! themselves, and [repository] reads package repositories and their
//! index tarballs (creating missing indexes for local repositories).
//!
//! The stateful side lives in [database]: the per-package records with
//! their lifecycle status, file index, checksums and maintenance
//! scripts, guarded by a single advisory lock per session. On top of it,
//! [install] plans and executes installations (the 18-step validation
//! pipeline, version-choice tree enumeration, unpack/configure with
//! maintenance-script recovery), and [remove] plans and executes
//! removals, deconfigurations, purges and autoremoval.
//!
//! Two small modules make the whole thing transactional: every
//! destructive procedure owns a [backup::BackupVault] that restores the
//! touched files unless the procedure commits, and a session may attach
//! a [tracker::Tracker] journal whose replay brings the database back to
//! its pre-session state.
//!
//! Diagnostics never go to a terminal directly; they are delivered as
//! structured events to an injected [output::Output] sink.
//!
//! ```no_run
//! use wpkg::database::Database;
//! use wpkg::install::{Installer, Step};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(std::path::Path::new("/target/var/lib/wpkg"))?;
//! let mut install = Installer::new(&db);
//! install.add_package("hello_1.0_linux-amd64.deb");
//! install.validate()?;
//! install.pre_configure()?;
//! while let Step::Item(idx) = install.unpack()? {
//!     install.configure(idx)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! | Flag    | Description                                                 |
//! | ------- | ----------------------------------------------------------- |
//! | `full`  | Enable all optional features.                               |
//! | `serde` | [serde::Serialize]/[serde::Deserialize] for the core types. |

pub mod architecture;
pub mod archive;
pub mod backup;
pub mod control;
pub mod database;
pub mod dependency;
pub mod install;
pub mod output;
pub mod remove;
pub mod repository;
pub mod tracker;
pub mod version;

mod errors;

// vim: foldmethod=marker

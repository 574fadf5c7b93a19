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

//! The `dependency` module contains support for parsing dependency
//! relationships between packages.
//!
//! This will parse fully populated Dependency relationships, as seen in
//! the control files of binary packages and in the installed-package
//! database.
//!
//! ```
//! use wpkg::dependency::Dependency;
//!
//! let dep: Dependency = "libfoo (>= 1.0) | libfoo-compat, libbar [!linux-arm64]"
//!     .parse()
//!     .unwrap();
//! ```
//!
//! # Overview of the [Dependency] model
//!
//! A [Dependency] is made up of a number of [Relation]s. All [Relation]s
//! must be satisfied. A [Relation] is made up of a number of [Possibility]
//! values. Any [Possibility] being satisfied will satisfy the [Relation].
//! A [Possibility] has a number of constraints on it (a
//! [VersionConstraint] or [ArchConstraints]), which dictate when it can be
//! considered.
//!
//! The dialect is strict about operators: `>=` is the default when a bare
//! version is given (and is omitted again on output), while `!=`, `<>` and
//! a lone `<` or `>` are rejected outright.
//!
//! # Feature `serde`
//!
//! This feature will enable explicit implementations of
//! [serde::Deserialize] and [serde::Serialize] for types in this module.

mod architecture;
#[allow(clippy::module_inception)]
mod dependency;
mod pest;
mod possibility;
mod relation;
mod tests;
mod version;

pub use architecture::ArchConstraints;
pub use dependency::{Dependency, Error};
pub use possibility::{is_package_name, Possibility};
pub use relation::Relation;
pub use version::{VersionConstraint, VersionOperator};

// vim: foldmethod=marker

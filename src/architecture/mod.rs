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

//! The `architecture` module contains support for understanding
//! architecture strings, tuples and patterns.
//!
//! Architectures show up in three places: the target database declares the
//! architecture it installs for, every binary package declares the
//! architecture it was built for, and dependency atoms may carry
//! architecture masks restricting where they apply. All three use the same
//! [Architecture] type.
//!
//! ```
//! use wpkg::architecture::Architecture;
//!
//! let host: Architecture = "linux-amd64".parse().unwrap();
//! let pattern: Architecture = "any-amd64".parse().unwrap();
//! assert!(host.matches(&pattern, false));
//! ```
//!
//! # Feature `serde`
//!
//! This feature will enable explicit implementations of
//! [serde::Deserialize] and [serde::Serialize] for types in this module.

#[allow(clippy::module_inception)]
mod architecture;

pub use architecture::{Architecture, Error};

// vim: foldmethod=marker

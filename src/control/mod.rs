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

//! The `control` module contains support for parsing RFC 2822-style
//! files into our conventional formats.
//!
//! Control data shows up all over: the `control` member of a binary
//! package, the per-package `control` and `wpkg-status` files in the
//! database, and the `.ctrl` members of a repository index are all
//! paragraphs of `Key: Value` fields with whitespace continuation lines
//! and `#` comments.
//!
//! [RawParagraph] is the low level parse result; [ControlFile] wraps it
//! with the case-insensitive field lookup the engine works with, and the
//! [fields] module holds the canonical field name spellings. The
//! [expression] module evaluates administrator-supplied field validation
//! expressions against any field lookup.

mod file;
mod paragraph;
mod pest;

pub mod expression;
pub mod fields;

pub use file::ControlFile;
pub use paragraph::{Error, RawField, RawParagraph};

// vim: foldmethod=marker

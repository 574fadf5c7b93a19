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

/// The maintenance scripts a package (or the database itself, through its
/// global hooks) may carry.
///
/// Scripts are invoked with a verb and positional arguments per the
/// maintenance script protocol (`preinst install <old-version>`,
/// `postinst configure <new-version>`, `prerm remove`, ...). A non-zero
/// exit status signals failure; the engine then runs the documented
/// recovery script for the step it was performing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScriptKind {
    /// Runs before the files of a package are unpacked.
    Preinst,

    /// Runs to configure a package (and to unwind failed steps via its
    /// `abort-*` verbs).
    Postinst,

    /// Runs before the files of a package are removed.
    Prerm,

    /// Runs after the files of a package were removed.
    Postrm,

    /// Runs during validation; a failure keeps the plan from executing.
    Validate,
}

impl ScriptKind {
    /// Return the [ScriptKind] as a borrowed string ref; this is also the
    /// name of the script file in the package record.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Preinst => "preinst",
            Self::Postinst => "postinst",
            Self::Prerm => "prerm",
            Self::Postrm => "postrm",
            Self::Validate => "validate",
        }
    }

    /// Every script kind, in lifecycle order.
    pub fn all() -> &'static [ScriptKind] {
        &[
            Self::Validate,
            Self::Preinst,
            Self::Postinst,
            Self::Prerm,
            Self::Postrm,
        ]
    }
}

impl std::fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// vim: foldmethod=marker

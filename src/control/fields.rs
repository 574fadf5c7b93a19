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

//! Canonical spellings of the control fields the engine reads and writes.
//! Lookup is case-insensitive either way; these exist so the engine agrees
//! with itself about what it writes.

/// The `Package` field.
pub const PACKAGE: &str = "Package";

/// The `Version` field.
pub const VERSION: &str = "Version";

/// The `Architecture` field.
pub const ARCHITECTURE: &str = "Architecture";

/// The `Depends` field.
pub const DEPENDS: &str = "Depends";

/// The `Pre-Depends` field.
pub const PRE_DEPENDS: &str = "Pre-Depends";

/// The `Conflicts` field.
pub const CONFLICTS: &str = "Conflicts";

/// The `Breaks` field.
pub const BREAKS: &str = "Breaks";

/// The `Replaces` field.
pub const REPLACES: &str = "Replaces";

/// The `Provides` field.
pub const PROVIDES: &str = "Provides";

/// The `Essential` field.
pub const ESSENTIAL: &str = "Essential";

/// The `Priority` field.
pub const PRIORITY: &str = "Priority";

/// The `Distribution` field.
pub const DISTRIBUTION: &str = "Distribution";

/// The `Maintainer` field.
pub const MAINTAINER: &str = "Maintainer";

/// The `Description` field.
pub const DESCRIPTION: &str = "Description";

/// The `Installed-Size` field, in kilobytes.
pub const INSTALLED_SIZE: &str = "Installed-Size";

/// The `Minimum-Upgradable-Version` field: the oldest installed version an
/// upgrade to this package is supported from.
pub const MINIMUM_UPGRADABLE_VERSION: &str = "Minimum-Upgradable-Version";

/// The `Packager-Version` field: the version of the packager that built
/// the package.
pub const PACKAGER_VERSION: &str = "Packager-Version";

/// The `Built-Using` field.
pub const BUILT_USING: &str = "Built-Using";

/// The `Build-Depends` field.
pub const BUILD_DEPENDS: &str = "Build-Depends";

/// The `Build-Depends-Arch` field.
pub const BUILD_DEPENDS_ARCH: &str = "Build-Depends-Arch";

/// The `Build-Depends-Indep` field.
pub const BUILD_DEPENDS_INDEP: &str = "Build-Depends-Indep";

/// The `X-Status` field: the lifecycle status of an installed package.
pub const X_STATUS: &str = "X-Status";

/// The `X-Selection` field: `normal`, `auto`, `hold` or `reject`.
pub const X_SELECTION: &str = "X-Selection";

/// The `X-Explicit` field: whether the package was named by the
/// administrator (as opposed to pulled in to satisfy a dependency).
pub const X_EXPLICIT: &str = "X-Explicit";

/// The `X-Install-Date` status stamp.
pub const X_INSTALL_DATE: &str = "X-Install-Date";

/// The `X-Remove-Date` status stamp.
pub const X_REMOVE_DATE: &str = "X-Remove-Date";

/// The `X-Removed-Date` status stamp, written once the files are gone.
pub const X_REMOVED_DATE: &str = "X-Removed-Date";

/// The `X-Deconfigure-Date` status stamp.
pub const X_DECONFIGURE_DATE: &str = "X-Deconfigure-Date";

/// The `X-Archive-Filename` field: where the archive a package was
/// unpacked from lived, used to re-extract configuration files on a
/// reconfigure.
pub const X_ARCHIVE_FILENAME: &str = "X-Archive-Filename";

/// The `Package-md5sum` field of a repository index entry.
pub const PACKAGE_MD5SUM: &str = "Package-md5sum";

/// The `Package-Size` field of a repository index entry.
pub const PACKAGE_SIZE: &str = "Package-Size";

/// The `Index-Date` field of a repository index entry.
pub const INDEX_DATE: &str = "Index-Date";

// vim: foldmethod=marker

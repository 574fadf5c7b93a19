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

use crate::database::PackageStatus;
use std::cell::Cell;

/// The classification of one package during a removal session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RemoveType {
    /// Named by the administrator; not resolved yet.
    Explicit,

    /// An explicit package that was validated and will be removed.
    Removing,

    /// Pulled in for removal because it depends on a package being
    /// removed (recursive force).
    Implicit,

    /// Installed and staying.
    Installed,

    /// Unpacked (not configured) and staying.
    Unpacked,

    /// Only configuration files remain; nothing to remove unless
    /// purging.
    ConfigFiles,

    /// In a `Half-*` state; removing it doubles as the repair.
    NeedRepair,

    /// Already removed (or never installed); nothing to do.
    Same,

    /// Determined to be unusable for this session.
    Invalid,
}

impl RemoveType {
    /// Whether items of this type are acted on by the session.
    pub fn is_to_remove(&self) -> bool {
        matches!(self, Self::Removing | Self::Implicit)
    }
}

/// One package of a removal session. Everything interesting about it
/// (fields, conffiles, file index, scripts) lives in the database record;
/// the item only carries the classification.
pub struct RemoveItem {
    name: String,
    version: String,
    architecture: String,
    item_type: RemoveType,
    original_status: PackageStatus,
    removed: Cell<bool>,
}

impl RemoveItem {
    pub(super) fn new(
        name: &str,
        version: String,
        architecture: String,
        item_type: RemoveType,
        original_status: PackageStatus,
    ) -> Self {
        RemoveItem {
            name: name.to_owned(),
            version,
            architecture,
            item_type,
            original_status,
            removed: Cell::new(false),
        }
    }

    /// The package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The installed version, as recorded.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The installed architecture, as recorded.
    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// The classification of the item.
    pub fn item_type(&self) -> RemoveType {
        self.item_type
    }

    pub(super) fn set_type(&mut self, item_type: RemoveType) {
        self.item_type = item_type;
    }

    /// The status the package had when the session started.
    pub fn original_status(&self) -> PackageStatus {
        self.original_status
    }

    pub(super) fn reset_original_status(&mut self, status: PackageStatus) {
        self.original_status = status;
    }

    /// Whether the package was configured when the session started; the
    /// journal instruction to restore it is `install` for a configured
    /// package and `unpack` otherwise.
    pub fn was_configured(&self) -> bool {
        self.original_status == PackageStatus::Installed
    }

    /// Whether this session already removed the files of this item.
    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }

    pub(super) fn mark_removed(&self) {
        self.removed.set(true);
    }
}

// vim: foldmethod=marker

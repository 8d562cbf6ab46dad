// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bit flag sets for elements and attribute layers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-element state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ElemFlags: u32 {
        /// Element is part of its collection's selection set.
        const SELECT = 1 << 0;
        /// Element is hidden from the editor.
        const HIDE = 1 << 1;
        /// Face needs re-tessellation.
        const UPDATE = 1 << 2;
        /// Scratch bits for tools; never persisted meaningfully.
        const TEMP1 = 1 << 3;
        const TEMP2 = 1 << 4;
        const TEMP3 = 1 << 5;
    }
}

bitflags! {
    /// Set of element kinds an attribute type may attach to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ElemTypeMask: u8 {
        const VERTEX = 1 << 0;
        const EDGE = 1 << 1;
        const LOOP = 1 << 2;
        const FACE = 1 << 3;
    }
}

bitflags! {
    /// Per-layer behavior bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LayerFlags: u32 {
        /// Removed by `strip_temp_layers`.
        const TEMPORARY = 1 << 0;
        /// Interpolation leaves the destination untouched.
        const NO_INTERP = 1 << 1;
        /// Interpolation copies the first source instead of blending.
        const NO_INTERP_COPY_ONLY = 1 << 2;
    }
}

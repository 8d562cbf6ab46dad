// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element identity: per-mesh id generation.
//!
//! Every live element carries an [`Eid`] that is unique within its mesh and
//! never handed out twice. Removed elements have their id overwritten with
//! [`Eid::FREED`]. Serialized references use eids, not arena keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element id. Non-negative while the element is live.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Eid(pub i64);

impl Eid {
    /// Sentinel stored in an element that has been removed from its mesh.
    pub const FREED: Eid = Eid(-1);

    /// Returns true unless this is the freed sentinel.
    pub fn is_live(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id generator owned by a single mesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EidGen {
    cur: i64,
}

impl EidGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next id.
    pub fn alloc(&mut self) -> Eid {
        let eid = Eid(self.cur);
        self.cur += 1;
        eid
    }

    /// Makes sure `eid` is never handed out again.
    pub fn reserve(&mut self, eid: Eid) {
        if eid.0 >= self.cur {
            self.cur = eid.0 + 1;
        }
    }

    /// The id that the next call to [`EidGen::alloc`] returns.
    pub fn max_cur(&self) -> i64 {
        self.cur
    }
}

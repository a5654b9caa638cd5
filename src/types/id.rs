// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of a record inside its store. Slots are assigned in insertion
/// order and never reused, so comparing slots compares insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct RecordSlot(pub u32);

impl RecordSlot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena handle for a database inside the registry. The generation
/// distinguishes successive incarnations that reuse the same arena slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DbHandle {
    pub index: u32,
    pub generation: u32,
}

/// Opaque session identifier handed out by `create_session`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sess-{}", self.0.simple())
    }
}

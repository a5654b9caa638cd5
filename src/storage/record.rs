// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Record definition.

use crate::math::normalize;
use crate::types::{Metadata, RecordSlot};

/// Lifecycle of a stored record: `Active -> Deleted`, and back to `Active`
/// only through an upsert of the same id. Tombstones are purged only when
/// the whole database is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordState {
    Active,
    Deleted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub slot: RecordSlot,
    pub values: Vec<f32>,
    pub metadata: Metadata,
    pub state: RecordState,
    /// Unit-length copy of `values`, scored by the index.
    pub(crate) unit: Vec<f32>,
}

impl VectorRecord {
    pub fn new(id: String, slot: RecordSlot, values: Vec<f32>, metadata: Metadata) -> Self {
        let unit = normalize(&values);
        Self {
            id,
            slot,
            values,
            metadata,
            state: RecordState::Active,
            unit,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == RecordState::Active
    }

    pub fn is_deleted(&self) -> bool {
        self.state == RecordState::Deleted
    }

    pub fn unit(&self) -> &[f32] {
        &self.unit
    }

    /// Rough in-memory footprint: vector payload, id and serialized metadata.
    pub fn estimated_size(&self) -> u64 {
        let values = (self.values.len() * std::mem::size_of::<f32>()) as u64;
        let meta = serde_json::to_vec(&self.metadata)
            .map(|b| b.len() as u64)
            .unwrap_or(0);
        values + self.id.len() as u64 + meta
    }
}

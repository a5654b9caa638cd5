// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Per-database record store.
//!
//! Records live in an append-only slot vector; the slot number doubles as the
//! insertion sequence used for tie-breaking. Upserts reuse the existing slot.

use rustc_hash::FxHashMap;

use crate::error::{EngineError, Result};
use crate::storage::record::{RecordState, VectorRecord};
use crate::types::{Metadata, RecordSlot};

/// What an upsert replaced, so the index can be kept in step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Upserted {
    pub slot: RecordSlot,
    pub previous: Option<RecordState>,
}

pub struct RecordStore {
    dim: usize,
    records: Vec<VectorRecord>,
    by_id: FxHashMap<String, RecordSlot>,
    active: usize,
    size_bytes: u64,
}

impl RecordStore {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            records: Vec::new(),
            by_id: FxHashMap::default(),
            active: 0,
            size_bytes: 0,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dim
    }

    pub fn check_dimensions(&self, values: &[f32]) -> Result<()> {
        if values.len() != self.dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim,
                found: values.len(),
            });
        }
        Ok(())
    }

    /// Inserts or overwrites the record with `id`, clearing any tombstone.
    pub fn upsert(&mut self, id: String, values: Vec<f32>, metadata: Metadata) -> Result<Upserted> {
        self.check_dimensions(&values)?;

        if let Some(&slot) = self.by_id.get(&id) {
            let record = &mut self.records[slot.index()];
            let previous = record.state;
            let old_size = record.estimated_size();
            *record = VectorRecord::new(id, slot, values, metadata);
            let new_size = record.estimated_size();
            self.size_bytes = self.size_bytes.saturating_sub(old_size) + new_size;
            if previous == RecordState::Deleted {
                self.active += 1;
            }
            return Ok(Upserted {
                slot,
                previous: Some(previous),
            });
        }

        let slot = RecordSlot(
            u32::try_from(self.records.len())
                .map_err(|_| EngineError::Internal("record slot space exhausted".into()))?,
        );
        let record = VectorRecord::new(id.clone(), slot, values, metadata);
        self.size_bytes += record.estimated_size();
        self.records.push(record);
        self.by_id.insert(id, slot);
        self.active += 1;
        Ok(Upserted {
            slot,
            previous: None,
        })
    }

    /// Turns an active record into a tombstone. Returns false if it already was one.
    pub fn mark_deleted(&mut self, slot: RecordSlot) -> bool {
        match self.records.get_mut(slot.index()) {
            Some(record) if record.is_active() => {
                record.state = RecordState::Deleted;
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    /// Top-level key replace of the live record's metadata.
    pub fn merge_metadata(&mut self, id: &str, patch: Metadata) -> Result<()> {
        let slot = self
            .slot_of_active(id)
            .ok_or_else(|| EngineError::NotFound(format!("record {:?}", id)))?;
        let record = &mut self.records[slot.index()];
        let old_size = record.estimated_size();
        for (key, value) in patch {
            record.metadata.insert(key, value);
        }
        let new_size = record.estimated_size();
        self.size_bytes = self.size_bytes.saturating_sub(old_size) + new_size;
        Ok(())
    }

    /// Looks up a record regardless of state.
    pub fn get(&self, id: &str) -> Option<&VectorRecord> {
        self.by_id.get(id).map(|slot| &self.records[slot.index()])
    }

    pub fn get_active(&self, id: &str) -> Option<&VectorRecord> {
        self.get(id).filter(|r| r.is_active())
    }

    pub fn slot_of_active(&self, id: &str) -> Option<RecordSlot> {
        self.get_active(id).map(|r| r.slot)
    }

    pub fn record(&self, slot: RecordSlot) -> Option<&VectorRecord> {
        self.records.get(slot.index())
    }

    /// All records, tombstones included, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &VectorRecord> {
        self.records.iter()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &VectorRecord> {
        self.records.iter().filter(|r| r.is_active())
    }

    pub fn active_len(&self) -> usize {
        self.active
    }

    /// Total stored records, tombstones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn deleted_len(&self) -> usize {
        self.records.len() - self.active
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

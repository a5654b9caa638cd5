// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Similarity indexes.
//!
//! Both implementations return exactly the brute-force answer; the IVF index
//! only prunes clusters that provably cannot contribute.

pub mod flat;
pub mod ivf;
pub mod kmeans;
pub mod topk;

use crate::filter::{self, FilterPredicate};
use crate::storage::{RecordStore, VectorRecord};
use crate::types::RecordSlot;

pub use flat::FlatIndex;
pub use ivf::IvfIndex;
pub use topk::{Scored, TopK};

/// Per-query candidate restrictions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanParams<'a> {
    pub filter: Option<&'a FilterPredicate>,
    /// Inclusive lower bound on the score.
    pub threshold: f32,
}

impl ScanParams<'_> {
    pub fn accepts(&self, record: &VectorRecord) -> bool {
        filter::matches_opt(self.filter, &record.metadata)
    }
}

pub trait VectorIndex {
    /// Called after `slot` became active (fresh insert or upsert).
    fn on_insert(&mut self, store: &RecordStore, slot: RecordSlot);
    /// Called after `slot` stopped being active (tombstone or overwrite).
    fn on_delete(&mut self, store: &RecordStore, slot: RecordSlot);
    fn rebuild(&mut self, store: &RecordStore);
    /// Best `k` live records for a unit-length query, best first, ties by
    /// insertion order.
    fn search(
        &self,
        store: &RecordStore,
        query_unit: &[f32],
        k: usize,
        params: &ScanParams<'_>,
    ) -> Vec<Scored>;
}

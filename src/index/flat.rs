// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Brute-force index.

use super::topk::{Scored, TopK};
use super::{ScanParams, VectorIndex};
use crate::math::cosine_score;
use crate::storage::{RecordStore, VectorRecord};
use crate::types::RecordSlot;

/// A stateless brute-force index that scans every live record.
#[derive(Default, Clone, Debug)]
pub struct FlatIndex;

impl VectorIndex for FlatIndex {
    fn on_insert(&mut self, _store: &RecordStore, _slot: RecordSlot) {}

    fn on_delete(&mut self, _store: &RecordStore, _slot: RecordSlot) {}

    fn rebuild(&mut self, _store: &RecordStore) {}

    fn search(
        &self,
        store: &RecordStore,
        query_unit: &[f32],
        k: usize,
        params: &ScanParams<'_>,
    ) -> Vec<Scored> {
        let mut top = TopK::new(k);
        score_into(&mut top, store.iter_active(), query_unit, params);
        top.into_sorted()
    }
}

/// Scores every candidate that passes the filter and threshold into `top`.
pub(crate) fn score_into<'a>(
    top: &mut TopK,
    candidates: impl Iterator<Item = &'a VectorRecord>,
    query_unit: &[f32],
    params: &ScanParams<'_>,
) {
    for record in candidates {
        if !record.is_active() || !params.accepts(record) {
            continue;
        }
        let score = cosine_score(query_unit, record.unit());
        if score < params.threshold {
            continue;
        }
        top.offer(Scored {
            slot: record.slot,
            score,
        });
    }
}

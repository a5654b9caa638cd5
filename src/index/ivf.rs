// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Inverted-file (IVF) index with exact pruning.
//!
//! Live records are partitioned by nearest centroid. Every list remembers its
//! radius, the largest L2 distance between the centroid and a member. For a
//! unit query `q` and any member `x` (unit or zero), the triangle inequality
//! gives `||q - x|| >= ||q - c|| - r`, and since `dot(q, x) <= 1 - ||q - x||^2 / 2`
//! the list's best possible score is bounded. Lists are visited best bound
//! first, and scanning stops once no remaining list can beat the current K-th
//! result or reach the threshold. The answer is therefore identical to a
//! brute-force scan.

use rustc_hash::FxHashMap;

use super::flat::score_into;
use super::kmeans::{nearest, spherical_kmeans};
use super::topk::{Scored, TopK};
use super::{ScanParams, VectorIndex};
use crate::config::IvfConfig;
use crate::math::l2_sq;
use crate::storage::RecordStore;
use crate::types::RecordSlot;

/// Slack added to every bound to absorb f32 rounding in the scorer.
const BOUND_SLACK: f32 = 1e-4;

/// Training samples at most this many points per list.
const TRAIN_POINTS_PER_LIST: usize = 256;

#[derive(Clone, Debug)]
pub struct IvfIndex {
    config: IvfConfig,
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<RecordSlot>>,
    radii: Vec<f32>,
    assignment: FxHashMap<RecordSlot, usize>,
    trained_on: usize,
}

impl IvfIndex {
    pub fn new(config: IvfConfig) -> Self {
        Self {
            config,
            centroids: Vec::new(),
            lists: Vec::new(),
            radii: Vec::new(),
            assignment: FxHashMap::default(),
            trained_on: 0,
        }
    }

    pub fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    pub fn n_lists(&self) -> usize {
        self.centroids.len()
    }

    /// Number of records currently assigned to a list.
    pub fn assigned(&self) -> usize {
        self.assignment.len()
    }

    pub fn config(&self) -> &IvfConfig {
        &self.config
    }

    fn clear(&mut self) {
        self.centroids.clear();
        self.lists.clear();
        self.radii.clear();
        self.assignment.clear();
        self.trained_on = 0;
    }

    fn assign(&mut self, slot: RecordSlot, unit: &[f32]) {
        let list = nearest(&self.centroids, unit);
        let dist = l2_sq(unit, &self.centroids[list]).sqrt();
        if dist > self.radii[list] {
            self.radii[list] = dist;
        }
        self.lists[list].push(slot);
        self.assignment.insert(slot, list);
    }

    fn unassign(&mut self, slot: RecordSlot) {
        if let Some(list) = self.assignment.remove(&slot) {
            let members = &mut self.lists[list];
            if let Some(pos) = members.iter().position(|s| *s == slot) {
                members.swap_remove(pos);
            }
            // The radius is left as is: a stale radius is still an upper bound.
        }
    }

    /// Applies the training policy after a mutation.
    fn maintain(&mut self, store: &RecordStore) {
        let live = store.active_len();
        if live < self.config.min_points {
            if self.is_trained() {
                tracing::trace!(live, "ivf: below floor, falling back to linear scan");
                self.clear();
            }
            return;
        }
        let grown = live as f32 >= self.trained_on as f32 * self.config.retrain_growth.max(1.0);
        if !self.is_trained() || (grown && live > self.trained_on) {
            self.rebuild(store);
        }
    }

    /// Lists ordered by their score bound, best first.
    fn visit_order(&self, query_unit: &[f32]) -> Vec<(usize, f32)> {
        let mut order: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.lists[*i].is_empty())
            .map(|(i, c)| {
                let d = l2_sq(query_unit, c).sqrt();
                let gap = (d - self.radii[i]).max(0.0);
                let bound = 1.0 - gap * gap / 4.0 + BOUND_SLACK;
                (i, bound)
            })
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        order
    }
}

impl VectorIndex for IvfIndex {
    fn on_insert(&mut self, store: &RecordStore, slot: RecordSlot) {
        if self.is_trained() && !self.assignment.contains_key(&slot) {
            if let Some(record) = store.record(slot) {
                self.assign(slot, record.unit());
            }
        }
        self.maintain(store);
    }

    fn on_delete(&mut self, store: &RecordStore, slot: RecordSlot) {
        self.unassign(slot);
        self.maintain(store);
    }

    fn rebuild(&mut self, store: &RecordStore) {
        let live = store.active_len();
        self.clear();
        if live < self.config.min_points {
            return;
        }

        let points: Vec<(RecordSlot, &[f32])> =
            store.iter_active().map(|r| (r.slot, r.unit())).collect();
        let n_lists = self.config.lists_for(points.len());

        let budget = n_lists * TRAIN_POINTS_PER_LIST;
        let stride = points.len().div_ceil(budget).max(1);
        let sample: Vec<(RecordSlot, &[f32])> = points.iter().step_by(stride).copied().collect();

        self.centroids = spherical_kmeans(&sample, n_lists, self.config.kmeans_iterations);
        self.lists = vec![Vec::new(); self.centroids.len()];
        self.radii = vec![0.0; self.centroids.len()];
        for (slot, unit) in &points {
            self.assign(*slot, unit);
        }
        self.trained_on = live;

        tracing::debug!(
            live,
            lists = self.centroids.len(),
            sampled = sample.len(),
            "ivf: centroids retrained"
        );
    }

    fn search(
        &self,
        store: &RecordStore,
        query_unit: &[f32],
        k: usize,
        params: &ScanParams<'_>,
    ) -> Vec<Scored> {
        if k == 0 {
            return Vec::new();
        }
        let mut top = TopK::new(k);
        if !self.is_trained() {
            score_into(&mut top, store.iter_active(), query_unit, params);
            return top.into_sorted();
        }

        let mut scanned = 0usize;
        for (list, bound) in self.visit_order(query_unit) {
            if bound < params.threshold {
                break;
            }
            if top.floor().is_some_and(|floor| bound < floor) {
                break;
            }
            let members = self.lists[list].iter().filter_map(|slot| store.record(*slot));
            score_into(&mut top, members, query_unit, params);
            scanned += 1;
        }
        tracing::trace!(scanned, lists = self.centroids.len(), "ivf: search finished");

        top.into_sorted()
    }
}

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bounded best-K collector.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::types::RecordSlot;

/// A scored record. Ordering: `Greater` means worse, i.e. lower score, then
/// later insertion. `BinaryHeap` therefore keeps the worst kept entry on top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    pub slot: RecordSlot,
    pub score: f32,
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

pub struct TopK {
    k: usize,
    heap: BinaryHeap<Scored>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.min(1024) + 1),
        }
    }

    pub fn offer(&mut self, candidate: Scored) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if self.heap.peek().is_some_and(|worst| candidate < *worst) {
            self.heap.pop();
            self.heap.push(candidate);
        }
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// Score of the worst kept entry, once `k` entries are held.
    pub fn floor(&self) -> Option<f32> {
        if self.is_full() {
            self.heap.peek().map(|s| s.score)
        } else {
            None
        }
    }

    /// Best first.
    pub fn into_sorted(self) -> Vec<Scored> {
        self.heap.into_sorted_vec()
    }
}

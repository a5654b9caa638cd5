// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Deterministic spherical k-means.
//!
//! Given the same points (and slots) the centroids are bit-identical across
//! runs: seeds are chosen by hashing quantized vectors, assignment ties go
//! to the lower centroid index, and empty clusters keep their old centroid.

use crate::math::{dot, normalize};
use crate::types::RecordSlot;

/// Trains up to `k` unit-length centroids over unit-length `points`.
///
/// Returns fewer than `k` centroids only when there are fewer points.
pub fn spherical_kmeans(points: &[(RecordSlot, &[f32])], k: usize, iterations: usize) -> Vec<Vec<f32>> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }

    if k >= points.len() {
        let mut sorted: Vec<_> = points.to_vec();
        sorted.sort_by_key(|(slot, _)| *slot);
        return sorted.into_iter().map(|(_, v)| v.to_vec()).collect();
    }

    let dim = points[0].1.len();

    let mut seeds: Vec<(u64, RecordSlot, &[f32])> = points
        .iter()
        .map(|(slot, v)| (hash_point(*slot, v), *slot, *v))
        .collect();
    seeds.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut centroids: Vec<Vec<f32>> = seeds.iter().take(k).map(|(_, _, v)| v.to_vec()).collect();

    let mut assignments = vec![0usize; points.len()];
    for _ in 0..iterations {
        let mut changed = false;
        for (i, (_, v)) in points.iter().enumerate() {
            let best = nearest(&centroids, v);
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        let mut sums = vec![vec![0f64; dim]; k];
        let mut counts = vec![0usize; k];
        for (i, (_, v)) in points.iter().enumerate() {
            let c = assignments[i];
            counts[c] += 1;
            for (acc, x) in sums[c].iter_mut().zip(v.iter()) {
                *acc += *x as f64;
            }
        }

        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let mean: Vec<f32> = sums[c].iter().map(|s| (*s / counts[c] as f64) as f32).collect();
            let unit = normalize(&mean);
            // A mean of opposing vectors can cancel out; keep the old centroid then.
            if unit.iter().any(|x| *x != 0.0) {
                centroids[c] = unit;
            }
        }

        if !changed {
            break;
        }
    }

    centroids
}

/// Index of the centroid with the highest dot product (lowest L2 distance for
/// unit vectors). Ties go to the lower index.
pub fn nearest(centroids: &[Vec<f32>], v: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_sim = f32::NEG_INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let sim = dot(v, c);
        if sim > best_sim {
            best_sim = sim;
            best = i;
        }
    }
    best
}

/// FNV-1a over the slot and the Q16.16-rounded components.
fn hash_point(slot: RecordSlot, v: &[f32]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for &val in v {
        let scaled = (val * 65536.0).round();
        let fixed = if scaled.is_nan() {
            0i32
        } else {
            scaled.clamp(i32::MIN as f32, i32::MAX as f32) as i32
        };
        for byte in fixed.to_le_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    for byte in slot.0.to_le_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod database_tests;
pub mod snapshot_tests;

use crate::types::Metadata;
use serde_json::Value;

/// Builds a metadata map from a `json!` object literal.
pub fn meta(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        other => panic!("metadata must be an object, got {other}"),
    }
}

/// Deterministic pseudo-random vectors (64-bit LCG), components in [-1, 1).
pub fn lcg_vectors(seed: u64, count: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
    };
    (0..count).map(|_| (0..dim).map(|_| next()).collect()).collect()
}

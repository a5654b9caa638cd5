// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Cosine similarity normalized to `[0, 1]`.

use super::dot::{dot, norm_f64};

/// Returns `v / ||v||`. A zero (or non-finite) vector maps to all zeros,
/// which scores a raw cosine of 0 against anything.
///
/// The norm stays in f64, so finite vectors whose norm overflows f32 still
/// normalize.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let n = norm_f64(v);
    if n == 0.0 || !n.is_finite() {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| (*x as f64 / n) as f32).collect()
}

/// Similarity between two already-normalized vectors.
///
/// Raw cosine in `[-1, 1]` is mapped linearly onto `[0, 1]`:
/// 1.0 is identical direction, 0.5 orthogonal, 0.0 opposite.
pub fn cosine_score(a_unit: &[f32], b_unit: &[f32]) -> f32 {
    let cos = dot(a_unit, b_unit).clamp(-1.0, 1.0);
    (cos + 1.0) / 2.0
}

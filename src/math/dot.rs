// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Dot product and Euclidean norm.

/// Dot product over the shared prefix of `a` and `b`.
///
/// Accumulates in f64 so that long embeddings do not lose precision.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0f64;
    for (x, y) in a.iter().zip(b) {
        sum += (*x as f64) * (*y as f64);
    }
    sum as f32
}

/// Euclidean (L2) norm.
pub fn norm(a: &[f32]) -> f32 {
    norm_f64(a) as f32
}

/// Euclidean norm without narrowing; `inf` only for non-finite input.
pub fn norm_f64(a: &[f32]) -> f64 {
    let mut sum = 0f64;
    for x in a {
        sum += (*x as f64) * (*x as f64);
    }
    sum.sqrt()
}

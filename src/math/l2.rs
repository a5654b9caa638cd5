// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Squared L2 distance.

/// Computes ||a - b||^2.
pub fn l2_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

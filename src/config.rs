// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Below this many live records a database is scanned linearly.
pub const DEFAULT_MIN_POINTS: usize = 3;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct IvfConfig {
    /// Live-record floor under which no clustering happens.
    pub min_points: usize,
    /// Upper bound on the number of centroids.
    pub max_lists: usize,
    /// Centroids are retrained once the live count reaches `retrain_growth`
    /// times the count they were trained on.
    pub retrain_growth: f32,
    pub kmeans_iterations: usize,
}

impl Default for IvfConfig {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            max_lists: 64,
            retrain_growth: 2.0,
            kmeans_iterations: 10,
        }
    }
}

impl IvfConfig {
    /// Number of centroids to train for `n` live records: about sqrt(n),
    /// clamped to `[1, max_lists]`.
    pub fn lists_for(&self, n: usize) -> usize {
        let target = (n as f64).sqrt().round() as usize;
        target.clamp(1, self.max_lists.max(1))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Dimensionality used when `CreateSessionOptions::dimensions` is unset.
    pub default_dimensions: usize,
    /// Owner recorded when the caller does not identify itself.
    pub default_owner: String,
    /// Bound on concurrent per-database searches in a multi-database query.
    pub max_concurrent_searches: usize,
    pub ivf: IvfConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_dimensions: 384,
            default_owner: "local".to_string(),
            max_concurrent_searches: 8,
            ivf: IvfConfig::default(),
        }
    }
}

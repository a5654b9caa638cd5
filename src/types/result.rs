// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Query options and query outputs.

use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::filter::FilterPredicate;

/// Options for a single-database search.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    pub filter: Option<FilterPredicate>,
    /// Inclusive lower bound on returned scores.
    pub threshold: f32,
    pub include_vectors: bool,
}

impl SearchOptions {
    pub fn with_filter(mut self, filter: FilterPredicate) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn include_vectors(mut self, include: bool) -> Self {
        self.include_vectors = include;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    /// Cosine similarity mapped to `[0, 1]`.
    pub score: f32,
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Set only by multi-database queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_database_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: usize,
    pub deleted_ids: Vec<String>,
}

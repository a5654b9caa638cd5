// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Multi-database search coordinator.
//!
//! One logical query is fanned out to several databases. Each database is
//! asked for its own best `top_k` on the Tokio blocking pool (or inline when
//! polled by another executor), at most `max_concurrency` at a time, and every
//! task is joined before merging. A
//! database that is missing, rejects the query or panics contributes nothing;
//! the coordinator itself never fails.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::filter::FilterPredicate;
use crate::registry::{DatabaseRegistry, SharedDatabase};
use crate::types::{SearchOptions, SearchResult};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchOptions {
    pub top_k: usize,
    #[serde(default)]
    pub threshold: f32,
    #[serde(default)]
    pub filter: Option<FilterPredicate>,
    #[serde(default)]
    pub include_vectors: bool,
}

impl MultiSearchOptions {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: FilterPredicate) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Options sent to each database. The local `top_k` equals the global
    /// one, which keeps the merged ranking identical to a query over the union.
    fn local(&self) -> SearchOptions {
        SearchOptions {
            filter: self.filter.clone(),
            threshold: self.threshold,
            include_vectors: self.include_vectors,
        }
    }
}

pub struct SearchCoordinator {
    registry: Arc<DatabaseRegistry>,
    max_concurrency: usize,
}

impl SearchCoordinator {
    pub fn new(registry: Arc<DatabaseRegistry>) -> Self {
        let max_concurrency = registry.config().max_concurrent_searches.max(1);
        Self {
            registry,
            max_concurrency,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<DatabaseRegistry> {
        &self.registry
    }

    /// Globally ranked results across `names`. Duplicate names are searched
    /// once; unknown names are skipped.
    pub async fn search_multiple_databases<S: AsRef<str>>(
        &self,
        names: &[S],
        query: &[f32],
        options: &MultiSearchOptions,
    ) -> Vec<SearchResult> {
        metrics::counter!("ragdb_multi_searches_total", 1);
        if names.is_empty() || options.top_k == 0 {
            return Vec::new();
        }

        let mut seen = FxHashSet::default();
        let targets: Vec<(String, Option<SharedDatabase>)> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| seen.insert(*name))
            .map(|name| (name.to_string(), self.registry.database(name)))
            .collect();

        let query: Arc<[f32]> = Arc::from(query);
        let local = Arc::new(options.local());
        let top_k = options.top_k;

        let per_database: Vec<Vec<SearchResult>> = stream::iter(targets)
            .map(|(name, db)| search_one(name, db, query.clone(), top_k, local.clone()))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let merged = merge_ranked(per_database, top_k);
        tracing::debug!(
            databases = names.len(),
            returned = merged.len(),
            top_k,
            "multi-database search finished"
        );
        merged
    }
}

async fn search_one(
    name: String,
    db: Option<SharedDatabase>,
    query: Arc<[f32]>,
    top_k: usize,
    options: Arc<SearchOptions>,
) -> Vec<SearchResult> {
    let Some(db) = db else {
        tracing::debug!(database = %name, "database not found, contributes no results");
        return Vec::new();
    };

    // Outside a Tokio runtime the search runs inline on the polling thread.
    let outcome = match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let task = handle.spawn_blocking(move || {
                let db = db.read();
                db.search(&query, top_k, &options)
            });
            task.await.map_err(|e| e.to_string())
        }
        Err(_) => {
            let db = db.read();
            Ok(db.search(&query, top_k, &options))
        }
    };

    match outcome {
        Ok(Ok(mut results)) => {
            for result in &mut results {
                result.source_database_name = Some(name.clone());
            }
            results
        }
        Ok(Err(e)) if e.is_validation() => {
            tracing::debug!(database = %name, error = %e, "query rejected by database, skipping");
            Vec::new()
        }
        Ok(Err(e)) => {
            tracing::warn!(database = %name, error = %e, "database search failed, skipping");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(database = %name, error = %e, "database search task aborted, skipping");
            Vec::new()
        }
    }
}

/// Concatenates per-database lists (in input order), sorts by score
/// descending and truncates to `top_k`. The sort is stable, so equal scores
/// keep per-database order and then database order.
pub fn merge_ranked(per_database: Vec<Vec<SearchResult>>, top_k: usize) -> Vec<SearchResult> {
    let mut merged: Vec<SearchResult> = per_database.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(top_k);
    merged
}

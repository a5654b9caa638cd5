// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Logging and metric descriptions for hosts embedding the engine.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `ragdb=info`).
/// Returns false if a global subscriber was already set.
pub fn init_tracing() -> bool {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ragdb=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Registers descriptions for every metric the engine emits. The host installs
/// the recorder/exporter of its choice.
pub fn describe_metrics() {
    metrics::describe_counter!("ragdb_vectors_inserted_total", "Vectors inserted or overwritten");
    metrics::describe_counter!("ragdb_vectors_deleted_total", "Vectors turned into tombstones");
    metrics::describe_counter!("ragdb_searches_total", "Single-database searches served");
    metrics::describe_histogram!("ragdb_search_duration_seconds", "Time spent in a single-database search");
    metrics::describe_counter!("ragdb_multi_searches_total", "Multi-database searches served");
    metrics::describe_gauge!("ragdb_databases", "Live databases in the registry");
}

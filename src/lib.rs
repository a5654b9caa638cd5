// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! ragdb: an embedded, multi-tenant vector engine for retrieval-augmented
//! generation.
//!
//! Named databases hold fixed-dimension embeddings with JSON metadata. Queries
//! rank by cosine similarity under a MongoDB-style metadata filter, either
//! within one database or fanned out across many.

pub mod config;
pub mod coordinator;
pub mod database;
pub mod error;
pub mod filter;
pub mod index;
pub mod math;
pub mod registry;
pub mod snapshot;
pub mod storage;
pub mod telemetry;
pub mod types;

pub use config::{EngineConfig, IvfConfig};
pub use coordinator::{MultiSearchOptions, SearchCoordinator};
pub use database::{DatabaseMetadata, DatabaseMetadataPatch, DatabaseStats, NewRecord, VectorDatabase};
pub use error::{EngineError, Result};
pub use filter::{FieldOp, FilterPredicate};
pub use registry::{CreateSessionOptions, DatabaseRegistry, Session, SharedDatabase};
pub use types::{DeleteResult, Metadata, SearchOptions, SearchResult, SessionId};

#[cfg(test)]
mod tests;

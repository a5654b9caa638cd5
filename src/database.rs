// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! A single named vector database: record store, IVF index and metadata.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::IvfConfig;
use crate::error::Result;
use crate::filter::{self, FilterPredicate};
use crate::index::{IvfIndex, ScanParams, VectorIndex};
use crate::math::normalize;
use crate::storage::{RecordState, RecordStore, VectorRecord};
use crate::types::{DeleteResult, Metadata, RecordSlot, SearchOptions, SearchResult};

/// A record to insert.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NewRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewRecord {
    pub fn new(id: impl Into<String>, values: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            values,
            metadata,
        }
    }
}

/// Point-in-time view of a database's descriptive metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMetadata {
    pub name: String,
    pub dimensions: usize,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub owner: String,
    pub description: Option<String>,
    /// Live (non-deleted) records.
    pub vector_count: usize,
    pub storage_size_bytes: u64,
    /// Caller-defined fields set through `update_database_metadata`.
    pub custom: Metadata,
}

/// Top-level patch for [`DatabaseMetadata`]; unset fields are preserved.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseMetadataPatch {
    pub owner: Option<String>,
    pub description: Option<String>,
    /// Removes the description; a `description` in the same patch wins.
    pub clear_description: bool,
    pub custom: Metadata,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub database_name: String,
    pub vector_count: usize,
    pub storage_size_bytes: u64,
    pub session_count: usize,
    pub dimensions: usize,
    pub deleted_count: usize,
    pub total_records: usize,
}

/// Microsecond clock that only moves forward.
#[derive(Debug)]
struct AccessClock(AtomicI64);

impl AccessClock {
    fn new(at: DateTime<Utc>) -> Self {
        AccessClock(AtomicI64::new(at.timestamp_micros()))
    }

    fn touch(&self) {
        self.0.fetch_max(Utc::now().timestamp_micros(), Ordering::AcqRel);
    }

    fn get(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }
}

pub struct VectorDatabase {
    name: String,
    owner: String,
    description: Option<String>,
    custom: Metadata,
    created_at: DateTime<Utc>,
    last_accessed: AccessClock,
    store: RecordStore,
    index: IvfIndex,
}

impl VectorDatabase {
    pub fn new(
        name: impl Into<String>,
        dimensions: usize,
        owner: impl Into<String>,
        created_at: DateTime<Utc>,
        ivf: IvfConfig,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            description: None,
            custom: Metadata::new(),
            created_at,
            last_accessed: AccessClock::new(created_at),
            store: RecordStore::new(dimensions),
            index: IvfIndex::new(ivf),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> usize {
        self.store.dimensions()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn index(&self) -> &IvfIndex {
        &self.index
    }

    /// Marks the database as accessed now.
    pub fn touch(&self) {
        self.last_accessed.touch();
    }

    /// Inserts or overwrites a record.
    pub fn insert(&mut self, id: impl Into<String>, values: Vec<f32>, metadata: Metadata) -> Result<()> {
        self.insert_unchecked(id.into(), values, metadata)?;
        self.touch();
        metrics::counter!("ragdb_vectors_inserted_total", 1);
        Ok(())
    }

    /// Inserts every record, or none if any has the wrong dimensionality.
    pub fn insert_batch(&mut self, records: Vec<NewRecord>) -> Result<usize> {
        for record in &records {
            self.store.check_dimensions(&record.values)?;
        }
        let count = records.len();
        for record in records {
            self.insert_unchecked(record.id, record.values, record.metadata)?;
        }
        self.touch();
        metrics::counter!("ragdb_vectors_inserted_total", count as u64);
        tracing::debug!(database = %self.name, count, "batch inserted");
        Ok(count)
    }

    fn insert_unchecked(&mut self, id: String, values: Vec<f32>, metadata: Metadata) -> Result<()> {
        let upserted = self.store.upsert(id, values, metadata)?;
        if upserted.previous.is_some_and(|state| state == RecordState::Active) {
            self.index.on_delete(&self.store, upserted.slot);
        }
        self.index.on_insert(&self.store, upserted.slot);
        Ok(())
    }

    /// Tombstones every live record matching `predicate`.
    pub fn soft_delete(&mut self, predicate: &FilterPredicate) -> DeleteResult {
        let targets: Vec<(RecordSlot, String)> = self
            .store
            .iter_active()
            .filter(|r| filter::matches(predicate, &r.metadata))
            .map(|r| (r.slot, r.id.clone()))
            .collect();
        self.tombstone(targets)
    }

    /// Tombstones the listed ids; absent or already-deleted ids are skipped.
    pub fn delete_by_ids<S: AsRef<str>>(&mut self, ids: &[S]) -> DeleteResult {
        let mut targets = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(slot) = self.store.slot_of_active(id.as_ref()) {
                targets.push((slot, id.as_ref().to_string()));
            }
        }
        self.tombstone(targets)
    }

    fn tombstone(&mut self, targets: Vec<(RecordSlot, String)>) -> DeleteResult {
        let mut result = DeleteResult::default();
        for (slot, id) in targets {
            if self.store.mark_deleted(slot) {
                self.index.on_delete(&self.store, slot);
                result.deleted_ids.push(id);
            }
        }
        result.deleted_count = result.deleted_ids.len();
        self.touch();
        if result.deleted_count > 0 {
            metrics::counter!("ragdb_vectors_deleted_total", result.deleted_count as u64);
            tracing::debug!(database = %self.name, count = result.deleted_count, "records tombstoned");
        }
        result
    }

    /// Merges `patch` into the live record's metadata (top-level replace).
    pub fn update_metadata(&mut self, id: &str, patch: Metadata) -> Result<()> {
        self.store.merge_metadata(id, patch)?;
        self.touch();
        Ok(())
    }

    /// The live record with `id`, if any.
    pub fn get(&self, id: &str) -> Option<&VectorRecord> {
        self.touch();
        self.store.get_active(id)
    }

    /// Best `top_k` live records by cosine similarity, best first.
    pub fn search(&self, query: &[f32], top_k: usize, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        self.store.check_dimensions(query)?;
        self.touch();

        let started = Instant::now();
        let query_unit = normalize(query);
        let params = ScanParams {
            filter: options.filter.as_ref(),
            threshold: options.threshold,
        };
        let hits = self.index.search(&self.store, &query_unit, top_k, &params);

        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|hit| {
                self.store.record(hit.slot).map(|record| SearchResult {
                    id: record.id.clone(),
                    score: hit.score,
                    metadata: record.metadata.clone(),
                    vector: options.include_vectors.then(|| record.values.clone()),
                    source_database_name: None,
                })
            })
            .collect();

        metrics::counter!("ragdb_searches_total", 1);
        metrics::histogram!("ragdb_search_duration_seconds", started.elapsed().as_secs_f64());
        tracing::trace!(
            database = %self.name,
            top_k,
            returned = results.len(),
            "search finished"
        );
        Ok(results)
    }

    /// Current descriptive metadata. Reading counts as an access.
    pub fn metadata(&self) -> DatabaseMetadata {
        self.touch();
        self.peek_metadata()
    }

    /// Same as [`metadata`](Self::metadata) without bumping the access clock.
    pub fn peek_metadata(&self) -> DatabaseMetadata {
        let last_accessed_at =
            DateTime::<Utc>::from_timestamp_micros(self.last_accessed.get()).unwrap_or(self.created_at);
        DatabaseMetadata {
            name: self.name.clone(),
            dimensions: self.dimensions(),
            created_at: self.created_at,
            last_accessed_at,
            owner: self.owner.clone(),
            description: self.description.clone(),
            vector_count: self.store.active_len(),
            storage_size_bytes: self.store.size_bytes(),
            custom: self.custom.clone(),
        }
    }

    pub fn apply_metadata_patch(&mut self, patch: DatabaseMetadataPatch) {
        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
        if patch.clear_description {
            self.description = None;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        for (key, value) in patch.custom {
            self.custom.insert(key, value);
        }
        self.touch();
    }

    /// Encodes the whole database for an external persistence layer.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        crate::snapshot::encode_snapshot(self)
    }

    pub fn stats(&self, session_count: usize) -> DatabaseStats {
        DatabaseStats {
            database_name: self.name.clone(),
            vector_count: self.store.active_len(),
            storage_size_bytes: self.store.size_bytes(),
            session_count,
            dimensions: self.dimensions(),
            deleted_count: self.store.deleted_len(),
            total_records: self.store.len(),
        }
    }
}

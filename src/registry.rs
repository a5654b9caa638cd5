// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Database registry: the multi-tenant namespace.
//!
//! Databases live in an arena of generation-checked slots; names and sessions
//! refer to them through [`DbHandle`]s. Deleting a database frees its slot and
//! bumps the slot generation, so stale handles can never reach a later
//! incarnation.
//!
//! Lock order: the registry lock is never held while a database lock is
//! being acquired.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::database::{
    DatabaseMetadata, DatabaseMetadataPatch, DatabaseStats, NewRecord, VectorDatabase,
};
use crate::error::{EngineError, Result};
use crate::snapshot::{decode::parse_metadata, decode_snapshot};
use crate::types::{DbHandle, SessionId};

pub type SharedDatabase = Arc<RwLock<VectorDatabase>>;

/// Options for the first creation of a database name. Ignored when the name
/// already exists.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreateSessionOptions {
    pub dimensions: Option<usize>,
    pub owner: Option<String>,
    pub description: Option<String>,
}

impl CreateSessionOptions {
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: Some(dimensions),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub database_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    handle: DbHandle,
}

struct ArenaSlot {
    generation: u32,
    db: Option<SharedDatabase>,
}

#[derive(Default)]
struct RegistryState {
    arena: Vec<ArenaSlot>,
    free: Vec<u32>,
    by_name: FxHashMap<String, DbHandle>,
    sessions: FxHashMap<SessionId, Session>,
    last_created_micros: i64,
}

impl RegistryState {
    fn resolve(&self, handle: DbHandle) -> Option<&SharedDatabase> {
        self.arena
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.db.as_ref())
    }

    fn allocate(&mut self, db: SharedDatabase) -> Result<DbHandle> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.arena[index as usize];
            slot.db = Some(db);
            return Ok(DbHandle {
                index,
                generation: slot.generation,
            });
        }
        let index = u32::try_from(self.arena.len())
            .map_err(|_| EngineError::Internal("database arena exhausted".into()))?;
        self.arena.push(ArenaSlot {
            generation: 0,
            db: Some(db),
        });
        Ok(DbHandle {
            index,
            generation: 0,
        })
    }

    fn release(&mut self, handle: DbHandle) {
        if let Some(slot) = self.arena.get_mut(handle.index as usize) {
            if slot.generation == handle.generation && slot.db.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
            }
        }
    }

    /// Creation timestamps strictly increase, even within one clock tick.
    fn next_created_at(&mut self) -> Result<DateTime<Utc>> {
        let micros = Utc::now()
            .timestamp_micros()
            .max(self.last_created_micros + 1);
        self.last_created_micros = micros;
        DateTime::<Utc>::from_timestamp_micros(micros)
            .ok_or_else(|| EngineError::Internal(format!("timestamp out of range: {}", micros)))
    }

    fn open_session(&mut self, name: &str, handle: DbHandle) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(
            id,
            Session {
                id,
                database_name: name.to_string(),
                created_at: Utc::now(),
                handle,
            },
        );
        id
    }

    fn session_count(&self, handle: DbHandle) -> usize {
        self.sessions.values().filter(|s| s.handle == handle).count()
    }

    fn live_databases(&self) -> usize {
        self.by_name.len()
    }
}

pub struct DatabaseRegistry {
    config: EngineConfig,
    state: RwLock<RegistryState>,
}

impl Default for DatabaseRegistry {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DatabaseRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Opens a session on `name`, creating the database on first use.
    pub fn create_session(&self, name: &str, options: CreateSessionOptions) -> Result<SessionId> {
        validate_name(name)?;
        let mut state = self.state.write();

        if let Some(&handle) = state.by_name.get(name) {
            let id = state.open_session(name, handle);
            tracing::debug!(database = name, session = %id, "session opened on existing database");
            return Ok(id);
        }

        self.create_locked(&mut state, name, options)
    }

    /// Destroys the database and every session bound to it.
    pub fn delete_database(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        let handle = state
            .by_name
            .remove(name)
            .ok_or_else(|| EngineError::NotFound(format!("database {:?}", name)))?;
        state.release(handle);
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.handle != handle);
        let dropped = before - state.sessions.len();

        metrics::gauge!("ragdb_databases", state.live_databases() as f64);
        tracing::info!(database = name, sessions = dropped, "database deleted");
        Ok(())
    }

    /// All live databases, newest first.
    pub fn list_databases(&self) -> Vec<DatabaseMetadata> {
        let dbs: Vec<SharedDatabase> = {
            let state = self.state.read();
            state
                .by_name
                .values()
                .filter_map(|h| state.resolve(*h).cloned())
                .collect()
        };
        let mut out: Vec<DatabaseMetadata> = dbs.iter().map(|db| db.read().peek_metadata()).collect();
        out.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        out
    }

    /// Reading metadata counts as an access.
    pub fn get_database_metadata(&self, name: &str) -> Option<DatabaseMetadata> {
        self.database(name).map(|db| db.read().metadata())
    }

    pub fn get_session(&self, session_id: &SessionId) -> Option<Session> {
        self.state.read().sessions.get(session_id).cloned()
    }

    pub fn update_database_metadata(
        &self,
        name: &str,
        patch: DatabaseMetadataPatch,
    ) -> Result<DatabaseMetadata> {
        let db = self
            .database(name)
            .ok_or_else(|| EngineError::NotFound(format!("database {:?}", name)))?;
        let mut db = db.write();
        db.apply_metadata_patch(patch);
        Ok(db.peek_metadata())
    }

    pub fn get_database_stats(&self, name: &str) -> Option<DatabaseStats> {
        let (db, sessions) = {
            let state = self.state.read();
            let handle = *state.by_name.get(name)?;
            (state.resolve(handle)?.clone(), state.session_count(handle))
        };
        let stats = db.read().stats(sessions);
        Some(stats)
    }

    /// Tears down every database and session.
    pub fn destroy_all_sessions(&self) {
        let mut state = self.state.write();
        let databases = state.by_name.len();
        let sessions = state.sessions.len();
        let last_created_micros = state.last_created_micros;
        *state = RegistryState {
            last_created_micros,
            ..RegistryState::default()
        };
        metrics::gauge!("ragdb_databases", 0.0);
        tracing::info!(databases, sessions, "all databases destroyed");
    }

    /// Shared handle to a live database.
    pub fn database(&self, name: &str) -> Option<SharedDatabase> {
        let state = self.state.read();
        let handle = *state.by_name.get(name)?;
        state.resolve(handle).cloned()
    }

    /// The database a session is bound to, if both are still alive.
    pub fn database_for_session(&self, session_id: &SessionId) -> Option<SharedDatabase> {
        let state = self.state.read();
        let session = state.sessions.get(session_id)?;
        state.resolve(session.handle).cloned()
    }

    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }

    fn create_locked(
        &self,
        state: &mut RegistryState,
        name: &str,
        options: CreateSessionOptions,
    ) -> Result<SessionId> {
        let dimensions = options.dimensions.unwrap_or(self.config.default_dimensions);
        if dimensions == 0 {
            return Err(EngineError::InvalidDimensions(dimensions));
        }
        let owner = options
            .owner
            .unwrap_or_else(|| self.config.default_owner.clone());
        let created_at = state.next_created_at()?;

        let mut db = VectorDatabase::new(name, dimensions, owner, created_at, self.config.ivf.clone());
        db.set_description(options.description);

        let handle = state.allocate(Arc::new(RwLock::new(db)))?;
        state.by_name.insert(name.to_string(), handle);
        let id = state.open_session(name, handle);

        metrics::gauge!("ragdb_databases", state.live_databases() as f64);
        tracing::info!(database = name, dimensions, session = %id, "database created");
        Ok(id)
    }

    /// Rebuilds a database from `encode_snapshot` output through the regular
    /// insert, delete and metadata operations, and opens a session on it.
    pub fn restore_snapshot(&self, data: &[u8]) -> Result<SessionId> {
        let snapshot = decode_snapshot(data)?;
        validate_name(&snapshot.name)?;

        let mut records = Vec::with_capacity(snapshot.records.len());
        let mut tombstones = Vec::new();
        for record in snapshot.records {
            // Rejected before the name is registered, so a bad snapshot leaves no trace.
            if record.values.len() != snapshot.dimensions {
                return Err(EngineError::DimensionMismatch {
                    expected: snapshot.dimensions,
                    found: record.values.len(),
                });
            }
            if record.deleted {
                tombstones.push(record.id.clone());
            }
            records.push(NewRecord::new(
                record.id,
                record.values,
                parse_metadata(&record.metadata_json)?,
            ));
        }
        let custom = parse_metadata(&snapshot.custom_json)?;

        let session = {
            let mut state = self.state.write();
            if state.by_name.contains_key(&snapshot.name) {
                return Err(EngineError::AlreadyExists(snapshot.name));
            }
            self.create_locked(
                &mut state,
                &snapshot.name,
                CreateSessionOptions {
                    dimensions: Some(snapshot.dimensions),
                    owner: Some(snapshot.owner),
                    description: snapshot.description,
                },
            )?
        };
        let db = self
            .database_for_session(&session)
            .ok_or_else(|| EngineError::Internal("restored database vanished".into()))?;
        {
            let mut db = db.write();
            db.insert_batch(records)?;
            db.delete_by_ids(&tombstones);
            db.apply_metadata_patch(DatabaseMetadataPatch {
                custom,
                ..DatabaseMetadataPatch::default()
            });
        }
        tracing::info!(database = %snapshot.name, "database restored from snapshot");
        Ok(session)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EngineError::InvalidName(name.to_string()));
    }
    Ok(())
}

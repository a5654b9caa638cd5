// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::{DatabaseSnapshot, SnapshotRecord, HEADER_SIZE, MAGIC, VERSION};
use crate::database::VectorDatabase;
use crate::error::{EngineError, Result};

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| EngineError::Snapshot(e.to_string()))
}

/// Serializes `db`, tombstones included.
pub fn encode_snapshot(db: &VectorDatabase) -> Result<Vec<u8>> {
    let meta = db.peek_metadata();
    let records = db
        .store()
        .iter()
        .map(|r| {
            Ok(SnapshotRecord {
                id: r.id.clone(),
                values: r.values.clone(),
                metadata_json: to_json(&r.metadata)?,
                deleted: r.is_deleted(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let snapshot = DatabaseSnapshot {
        name: meta.name,
        dimensions: meta.dimensions,
        owner: meta.owner,
        description: meta.description,
        custom_json: to_json(&meta.custom)?,
        records,
    };

    encode_payload(&snapshot)
}

/// Wraps an already assembled snapshot in the checksummed envelope.
pub fn encode_payload(snapshot: &DatabaseSnapshot) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(snapshot, bincode::config::standard())
        .map_err(|e| EngineError::Snapshot(e.to_string()))?;
    let digest = blake3::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(digest.as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

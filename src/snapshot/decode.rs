// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::{DatabaseSnapshot, HEADER_SIZE, MAGIC, VERSION};
use crate::error::{EngineError, Result};
use crate::types::Metadata;

/// Parses and verifies a snapshot produced by `encode_snapshot`.
pub fn decode_snapshot(data: &[u8]) -> Result<DatabaseSnapshot> {
    if data.len() < HEADER_SIZE {
        return Err(EngineError::Snapshot(format!(
            "truncated header: {} bytes",
            data.len()
        )));
    }
    if data[0..4] != MAGIC {
        return Err(EngineError::Snapshot("bad magic".into()));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&data[4..8]);
    let version = u32::from_le_bytes(version);
    if version != VERSION {
        return Err(EngineError::Snapshot(format!("unsupported version {}", version)));
    }

    let payload = &data[HEADER_SIZE..];
    if blake3::hash(payload).as_bytes() != &data[8..HEADER_SIZE] {
        return Err(EngineError::Snapshot("checksum mismatch".into()));
    }

    let (snapshot, _): (DatabaseSnapshot, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(|e| EngineError::Snapshot(e.to_string()))?;
    Ok(snapshot)
}

/// Parses a JSON object carried inside a snapshot.
pub fn parse_metadata(json: &str) -> Result<Metadata> {
    serde_json::from_str(json).map_err(|e| EngineError::Snapshot(e.to_string()))
}

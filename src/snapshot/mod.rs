// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Database snapshots for external persistence.
//!
//! Layout: `magic (4) | version (u32 LE) | blake3(payload) (32) | payload`,
//! where the payload is a bincode-encoded [`DatabaseSnapshot`]. JSON values
//! are carried as strings since bincode cannot decode self-describing data.

pub mod decode;
pub mod encode;

use serde::{Deserialize, Serialize};

pub use decode::decode_snapshot;
pub use encode::{encode_payload, encode_snapshot};

pub const MAGIC: [u8; 4] = *b"RGDB";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 4 + 4 + 32;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SnapshotRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata_json: String,
    pub deleted: bool,
}

/// Everything needed to rebuild a database, records in insertion order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DatabaseSnapshot {
    pub name: String,
    pub dimensions: usize,
    pub owner: String,
    pub description: Option<String>,
    pub custom_json: String,
    pub records: Vec<SnapshotRecord>,
}

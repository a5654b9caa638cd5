// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod id;
pub mod result;

use serde_json::{Map, Value};

/// Record metadata: top-level string keys mapped to arbitrary JSON values.
pub type Metadata = Map<String, Value>;

pub use id::{DbHandle, RecordSlot, SessionId};
pub use result::{DeleteResult, SearchOptions, SearchResult};

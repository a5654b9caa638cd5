// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid database name: {0:?}")]
    InvalidName(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid dimensionality: {0} (must be positive)")]
    InvalidDimensions(usize),

    #[error("Database already exists: {0}")]
    AlreadyExists(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Validation failures are the caller's fault and are never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::DimensionMismatch { .. }
                | EngineError::InvalidFilter(_)
                | EngineError::InvalidName(_)
                | EngineError::InvalidDimensions(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

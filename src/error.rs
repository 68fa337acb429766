//! Error types for Quark
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using QuarkError
pub type Result<T> = std::result::Result<T, QuarkError>;

/// Unified error type for Quark operations
#[derive(Debug, Error)]
pub enum QuarkError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source {path:?} unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Container Errors
    // -------------------------------------------------------------------------
    #[error("Container format error: {0}")]
    Format(String),

    #[error("Store has no records")]
    EmptyStore,

    #[error("Store is full (255 records)")]
    StoreFull,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    NameCollision(String),

    #[error("Invalid insert position {position} (record count is {count})")]
    InvalidPosition { position: usize, count: usize },

    #[error("Reorder references unknown record: {0}")]
    UnknownRecord(String),

    #[error("Reorder is not a permutation: {0}")]
    InvalidOrder(String),

    // -------------------------------------------------------------------------
    // Optimizer Errors
    // -------------------------------------------------------------------------
    #[error("Access log error: {0}")]
    AccessLog(String),

    #[error("No optimization available: {0}")]
    NoOptimizationAvailable(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for QuarkError {
    fn from(err: csv::Error) -> Self {
        QuarkError::AccessLog(err.to_string())
    }
}

//! Typed errors for the ingestion pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so the HTTP layer
//! can map each variant to a distinct status code. Preview lifecycle
//! errors carry no payload and propagate unchanged from the store to
//! the boundary.

use thiserror::Error;

/// Errors that can occur during ingestion operations.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Malformed input, rejected before any external call or persistence
    #[error("invalid input: {0}")]
    Validation(String),

    /// External extraction failed after exhausting model fallback.
    /// The message is the user-facing text; the internal cause is
    /// logged at the orchestrator boundary, never exposed.
    #[error("{0}")]
    Extraction(String),

    /// No preview with the requested id
    #[error("preview not found")]
    PreviewNotFound,

    /// Preview exists but belongs to another user
    #[error("preview belongs to another user")]
    PreviewForbidden,

    /// Preview TTL elapsed; the record was removed on read
    #[error("preview has expired")]
    PreviewExpired,

    /// Category reference could not be satisfied (creation race)
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IngestionError {
    /// Wrap an arbitrary error as a storage failure.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;

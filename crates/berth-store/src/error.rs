//! Error types for the store module.

use thiserror::Error;

use berth_core::ValidationError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The (package, version) key is already claimed.
    #[error("entity already exists: {id}@{version}")]
    AlreadyExists { id: String, version: String },

    /// Unknown id, version, or package.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// Structural violation caught before any write.
    #[error("invalid entity: {0}")]
    InvalidEntity(#[from] ValidationError),

    /// Backing store unreachable or timed out. Retryable; guaranteed no
    /// partial write.
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Unexpected backing-store behavior.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether the caller may retry the operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

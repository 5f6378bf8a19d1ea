//! Error taxonomy for the Registry.
//!
//! Every failure is classified by how a caller should react:
//! structural and signature errors are final, conflicts need a new
//! version, `Unavailable` is retryable with backoff, and `Internal`
//! surfaces nothing beyond its occurrence (details go to the log).

use thiserror::Error;

use berth_core::{CoreError, ValidationError};
use berth_resolver::ResolveError;
use berth_store::StoreError;

/// Errors surfaced by Registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Structural violation. Unrecoverable; never retried.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Signature decode failure or cryptographic mismatch. Never retried.
    #[error("invalid signature")]
    InvalidSignature,

    /// Race loser or genuine duplicate; the caller picks a new version.
    #[error("already exists: {id}@{version}")]
    AlreadyExists { id: String, version: String },

    /// Unknown id, version, or package.
    #[error("not found: {0}")]
    NotFound(String),

    /// Cyclic dependency graph; no plan is returned.
    #[error("dependency cycle involving {0}")]
    DependencyCycle(String),

    /// Resolution aborted by the depth bound or a blocking
    /// missing-interface policy.
    #[error("resolution failed: {0}")]
    ResolutionFailed(String),

    /// Backing-store I/O failure. Retryable with backoff; guaranteed no
    /// partial write.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Unexpected failure. Logged with context, surfaced generically.
    #[error("internal error")]
    Internal,
}

impl RegistryError {
    /// Whether the caller may retry the operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Unavailable(_))
    }
}

impl From<ValidationError> for RegistryError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::SignatureFailed => RegistryError::InvalidSignature,
            other => RegistryError::InvalidSchema(other.to_string()),
        }
    }
}

impl From<CoreError> for RegistryError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature
            | CoreError::InvalidPublicKey
            | CoreError::UnsupportedAlgorithm(_)
            | CoreError::WireDecode(_) => RegistryError::InvalidSignature,
            CoreError::EncodingError(msg) => {
                tracing::error!(%msg, "entity encoding failed");
                RegistryError::Internal
            }
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyExists { id, version } => {
                RegistryError::AlreadyExists { id, version }
            }
            StoreError::NotFound(key) => RegistryError::NotFound(key),
            StoreError::InvalidEntity(v) => v.into(),
            StoreError::Unavailable(msg) => RegistryError::Unavailable(msg),
            StoreError::Serialization(msg) | StoreError::Internal(msg) => {
                tracing::error!(%msg, "store failure");
                RegistryError::Internal
            }
        }
    }
}

impl From<ResolveError> for RegistryError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::DependencyCycle(id) => RegistryError::DependencyCycle(id),
            ResolveError::RootNotFound(key) => RegistryError::NotFound(key),
            ResolveError::DepthExceeded(_) | ResolveError::MissingInterfaces(_) => {
                RegistryError::ResolutionFailed(e.to_string())
            }
            ResolveError::Store(e) => e.into(),
        }
    }
}

/// Result type for Registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

//! Error types for Berth Core.

use thiserror::Error;

/// Core errors from canonicalization and cryptography.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("wire decode error: {0}")]
    WireDecode(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Validation errors for entity structure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature verification failed")]
    SignatureFailed,

    #[error("invalid package id: {0}")]
    InvalidPackageId(String),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid artifact uri: {0}")]
    InvalidUri(String),

    #[error("invalid interface tag: {0}")]
    InvalidInterfaceTag(String),

    #[error("interface list exceeds maximum length of {max}")]
    TooManyInterfaces { max: usize },

    #[error("dependency list exceeds maximum length of {max}")]
    TooManyDependencies { max: usize },

    #[error("invalid dependency range for {id}: {range}")]
    InvalidRange { id: String, range: String },

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature
            | CoreError::InvalidPublicKey
            | CoreError::UnsupportedAlgorithm(_)
            | CoreError::WireDecode(_) => ValidationError::SignatureFailed,
            CoreError::EncodingError(msg) => ValidationError::StructuralError(msg),
        }
    }
}

//! Error types for dependency resolution.

use thiserror::Error;

use berth_store::StoreError;

/// Errors that can occur while resolving a dependency graph.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The id-level dependency graph contains a cycle; no linear install
    /// order exists, so no partial plan is returned.
    #[error("dependency cycle involving {0}")]
    DependencyCycle(String),

    /// The requested root entity is unknown.
    #[error("root entity not found: {0}")]
    RootNotFound(String),

    /// The traversal hit the configured depth bound.
    #[error("resolution exceeded maximum depth {0}")]
    DepthExceeded(usize),

    /// Unsatisfied interfaces under a blocking policy.
    #[error("unsatisfied interfaces: {}", .0.join(", "))]
    MissingInterfaces(Vec<String>),

    /// Error reading from the entity store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

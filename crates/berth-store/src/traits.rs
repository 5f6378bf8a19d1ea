//! Backing trait: the abstract interface to the external keyed store.
//!
//! The registry is stateless per request; every durable byte lives
//! behind this trait. Implementations include an in-memory map (for
//! tests) and a networked keyed-store client (production).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Result of a put-if-absent claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// The key was absent and now holds this caller's value.
    Claimed,
    /// The key was already present; nothing was written.
    Lost,
}

/// The Backing trait: async keyed-store primitives.
///
/// # Design Notes
///
/// - **`put_if_absent` is the load-bearing primitive**: it must be a
///   single compare-and-set in the backing service. Exactly one of any
///   number of concurrent callers for the same key observes `Claimed`;
///   the rest observe `Lost` with no side effects. It must never be
///   decomposed into a separate existence check plus a write, because
///   multiple process instances run against the same backing.
/// - **Sets** are unordered member collections used for derived indexes.
///   `set_add` is idempotent.
/// - Every call on a remote backing is a network round-trip and must be
///   bounded by a timeout; a timed-out call fails with
///   [`crate::StoreError::Unavailable`] and has caused no partial write.
#[async_trait]
pub trait Backing: Send + Sync {
    /// Read a value by key.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Atomically write `value` only if `key` is absent.
    async fn put_if_absent(&self, key: &str, value: Bytes) -> Result<ClaimResult>;

    /// Unconditionally write a value.
    ///
    /// Used for derived aggregates only, never for primary records.
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;

    /// Add a member to the set stored at `key`.
    async fn set_add(&self, key: &str, member: &str) -> Result<()>;

    /// List the members of the set stored at `key` (empty if absent).
    async fn set_members(&self, key: &str) -> Result<Vec<String>>;
}

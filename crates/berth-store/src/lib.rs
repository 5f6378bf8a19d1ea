//! # Berth Store
//!
//! Storage abstraction for the Berth registry. One storage engine
//! ([`EntityStore`]) behind one interface, with a pluggable keyed-store
//! backing: [`MemoryBacking`] for tests, [`HttpBacking`] for the
//! networked keyed store in production.
//!
//! ## Key Types
//!
//! - [`Backing`] - Async keyed-store primitives (get / put-if-absent /
//!   sets)
//! - [`EntityStore`] - The versioned entity engine: atomic claim plus
//!   derived indexes
//! - [`StoredEntity`] - One immutable `(package, version)` record
//! - [`PackageSummary`] - Derived per-package aggregate
//!
//! ## Design Notes
//!
//! - **First-come-first-serve claims**: the first successful `store()`
//!   for a key wins; later writers observe `AlreadyExists`.
//! - **Validation precedes mutation**: a structurally invalid entity
//!   never causes a partial index write.
//! - **Claim happens-before fan-out**: no reader observes a record
//!   without its mandatory version/package index entries.
//! - **Backing selection is explicit**: injected at construction, never
//!   read from process-wide state.

pub mod entity;
pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use entity::{EntityStore, PackageSummary, SearchHit, StoredEntity};
pub use error::{Result, StoreError};
pub use http::HttpBacking;
pub use memory::MemoryBacking;
pub use traits::{Backing, ClaimResult};

//! # Berth
//!
//! The unified API for the Berth registry - versioned, signed
//! application bundles with first-come-first-serve namespace claims and
//! semver dependency resolution.
//!
//! ## Overview
//!
//! Berth stores immutable `(package, version)` records. Developers
//! publish Manifests (v1) or Bundles (v2); consumers fetch, search, and
//! resolve transitive dependency graphs against semver constraints.
//!
//! ## Key Concepts
//!
//! - **Entity**: Immutable once claimed. A new version is a new entity;
//!   there is no update or delete path.
//! - **Canonical form**: JCS-style JSON, the exact byte sequence that is
//!   signed and exposed for external re-verification.
//! - **FCFS claim**: the first successfully stored key wins; later
//!   writers observe a conflict.
//! - **Resolution**: best-effort plans that degrade on version
//!   conflicts and refuse cyclic graphs.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use berth::{Registry, RegistryConfig};
//! use berth::store::MemoryBacking;
//!
//! async fn example() {
//!     // In production the backing is an HttpBacking pointed at the
//!     // keyed-store service; tests use MemoryBacking.
//!     let registry = Registry::new(MemoryBacking::new(), RegistryConfig::default());
//!
//!     let payload = br#"{
//!         "id": "com.example.app",
//!         "name": "Example App",
//!         "version": "1.0.0",
//!         "artifact": {
//!             "type": "wasm",
//!             "target": "wasm32-wasi",
//!             "digest": "sha256:0000000000000000000000000000000000000000000000000000000000000000",
//!             "uri": "https://artifacts.example.com/app.wasm"
//!         }
//!     }"#;
//!     let receipt = registry.publish(payload).await.unwrap();
//!     assert_eq!(receipt.version, "1.0.0");
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `berth::core` - Entity schemas, canonicalization, signatures
//! - `berth::store` - Storage engine and keyed-store backings
//! - `berth::resolver` - Dependency resolution and caching

pub mod config;
pub mod error;
pub mod registry;

// Re-export component crates
pub use berth_core as core;
pub use berth_resolver as resolver;
pub use berth_store as store;

// Re-export main types for convenience
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use registry::{PublishReceipt, Registry};

// Re-export commonly used component types
pub use berth_core::{
    Bundle, Entity, EntityKey, Keypair, Manifest, PublicKey, SchemaVersion, Sha256Hash,
    SignatureBlock, SignaturePolicy,
};
pub use berth_resolver::{PlanEntry, Resolution, ResolverConfig};
pub use berth_store::{HttpBacking, MemoryBacking, PackageSummary, SearchHit, StoredEntity};

//! # Berth Core
//!
//! Pure primitives for the Berth registry: entity schemas, canonical
//! JSON, signatures, and validation.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over the registry's data model.
//!
//! ## Key Types
//!
//! - [`Entity`] - A published record in either schema (Manifest v1 or
//!   Bundle v2)
//! - [`EntityKey`] - The immutable `(package, version)` identity
//! - [`SignatureBlock`] - Detached Ed25519 signature over canonical bytes
//! - [`OwnerPolicy`] - Who may write to an already-claimed key
//!
//! ## Canonicalization
//!
//! Entities are signed over a JCS-style canonical JSON form. See
//! [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod manifest;
pub mod types;
pub mod validation;
pub mod verify;
pub mod version;

pub use canonical::{
    canonical_bytes, canonical_json, canonicalize_value, signing_digest, strip_transport_fields,
};
pub use crypto::{Keypair, PublicKey, Sha256Hash, Signature};
pub use error::{CoreError, ValidationError};
pub use manifest::{
    Artifact, Bundle, BundleMetadata, Dependency, Entity, Interfaces, Manifest, SchemaVersion,
    SignatureBlock, WasmRef, MAX_DEPENDENCIES, MAX_INTERFACES,
};
pub use types::{DigestRef, EntityKey, InterfaceTag, PackageId};
pub use validation::{validate_bundle, validate_entity, validate_manifest};
pub use verify::{
    is_allowed_owner, sign_entity, verify_block, verify_entity, OwnerPolicy, SignaturePolicy,
};
pub use version::{
    cmp_versions_desc, highest_satisfying, is_strictly_greater, parse_range, parse_version,
    sort_versions_desc, Version, VersionReq,
};

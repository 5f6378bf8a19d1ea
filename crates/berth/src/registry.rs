//! The Registry: unified API over verification, storage, and resolution.
//!
//! A publish request flows size limit → transport-field strip → schema
//! parse → structural validation → canonicalization → signature policy
//! → atomic claim → index fan-out → cache invalidation. Resolution
//! reads from the store's views only; it never writes.

use serde::{Deserialize, Serialize};

use berth_core::{
    canonicalize_value, strip_transport_fields, validate_entity, verify_block, Entity,
    Sha256Hash, SignaturePolicy,
};
use berth_resolver::{PlanEntry, Resolution, ResolutionCache, Resolver, TouchTracker};
use berth_store::{Backing, EntityStore, PackageSummary, SearchHit, StoredEntity};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

/// Returned to a publisher on a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub id: String,
    pub version: String,
    /// Unix milliseconds at which the claim succeeded.
    pub created_at: i64,
    /// Stable path at which the canonical form can be re-fetched.
    pub canonical_uri: String,
}

/// The registry facade.
///
/// Stateless per request; all durable state lives behind the injected
/// backing, so any number of instances may run against the same store.
pub struct Registry<B: Backing> {
    store: EntityStore<B>,
    resolver: Resolver,
    cache: ResolutionCache,
    config: RegistryConfig,
}

impl<B: Backing> Registry<B> {
    /// Create a registry over the given backing.
    pub fn new(backing: B, config: RegistryConfig) -> Self {
        Self {
            store: EntityStore::new(backing),
            resolver: Resolver::new(config.resolver.clone()),
            cache: ResolutionCache::new(),
            config,
        }
    }

    /// The underlying entity store.
    pub fn store(&self) -> &EntityStore<B> {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publish
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish a raw JSON document (Manifest v1 or Bundle v2).
    ///
    /// The signature is verified over the canonical form of the document
    /// as submitted, so transport-only `_` fields never affect it.
    pub async fn publish(&self, payload: &[u8]) -> Result<PublishReceipt> {
        if payload.len() > self.config.max_payload_bytes {
            return Err(RegistryError::InvalidSchema(format!(
                "payload exceeds {} bytes",
                self.config.max_payload_bytes
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| RegistryError::InvalidSchema(e.to_string()))?;
        let entity = Entity::from_value(strip_transport_fields(&value))?;
        let canonical = canonicalize_value(&value);

        self.publish_prepared(&entity, canonical).await
    }

    /// Publish an already-parsed entity.
    pub async fn publish_entity(&self, entity: &Entity) -> Result<PublishReceipt> {
        let canonical = berth_core::canonical_bytes(entity)?;
        self.publish_prepared(entity, canonical).await
    }

    async fn publish_prepared(
        &self,
        entity: &Entity,
        canonical: Vec<u8>,
    ) -> Result<PublishReceipt> {
        validate_entity(entity)?;

        match entity.signature() {
            Some(block) => verify_block(block, &Sha256Hash::hash(&canonical))?,
            None if self.signature_policy(entity).allow_unsigned => {}
            None => return Err(RegistryError::InvalidSignature),
        }

        let record = self.store.store(entity, &canonical).await?;

        // Any cached resolution that read this package is now stale.
        self.cache.invalidate_package(entity.id());
        tracing::debug!(id = %entity.id(), version = %entity.version(), "published entity");

        Ok(PublishReceipt {
            id: record.entity.id().to_string(),
            version: record.entity.version().to_string(),
            created_at: record.created_at,
            canonical_uri: format!(
                "/{}/{}?canonical=true",
                record.entity.id(),
                record.entity.version()
            ),
        })
    }

    fn signature_policy(&self, entity: &Entity) -> SignaturePolicy {
        match entity {
            Entity::Manifest(_) => self.config.manifest_signatures,
            Entity::Bundle(_) => self.config.bundle_signatures,
        }
    }

    /// Whether `public_key` may perform a non-creating write to an
    /// already-claimed key. First-time claims never consult this.
    pub async fn check_ownership(
        &self,
        id: &str,
        version: &str,
        public_key: &str,
    ) -> Result<bool> {
        let record = self.store.get(id, version).await?;
        Ok(berth_core::is_allowed_owner(&record.entity, public_key))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch one stored entity.
    pub async fn get(&self, id: &str, version: &str) -> Result<StoredEntity> {
        Ok(self.store.get(id, version).await?)
    }

    /// The canonical JCS form stored at publish time, verbatim.
    pub async fn canonical_json(&self, id: &str, version: &str) -> Result<String> {
        let record = self.store.get(id, version).await?;
        Ok(record.canonical)
    }

    /// All versions of a package, descending by semver precedence.
    pub async fn list_versions(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.store.list_versions(id).await?)
    }

    /// All known package ids.
    pub async fn list_packages(&self) -> Result<Vec<String>> {
        Ok(self.store.list_packages().await?)
    }

    /// The derived aggregate for a package.
    pub async fn package_summary(&self, id: &str) -> Result<Option<PackageSummary>> {
        Ok(self.store.package_summary(id).await?)
    }

    /// Case-insensitive substring search; empty result on no match.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        Ok(self.store.search(query).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolve
    // ─────────────────────────────────────────────────────────────────────────

    /// Compute an install plan for the root against the store, reading
    /// through the resolution cache.
    pub async fn resolve(
        &self,
        root_id: &str,
        root_version: &str,
        installed: &[PlanEntry],
    ) -> Result<Resolution> {
        if let Some(hit) = self.cache.lookup(root_id, root_version, installed) {
            return Ok(hit);
        }

        let tracker = TouchTracker::new(&self.store);
        let resolution = self
            .resolver
            .resolve(&tracker, root_id, root_version, installed)
            .await?;
        self.cache.insert(
            root_id,
            root_version,
            installed,
            resolution.clone(),
            tracker.into_touched(),
        );
        Ok(resolution)
    }
}

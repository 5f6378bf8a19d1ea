//! The versioned entity store: atomic claims plus derived indexes.
//!
//! One engine behind one interface. The backing is injected at
//! construction; tests use [`crate::MemoryBacking`], production uses
//! [`crate::HttpBacking`]. The primary-key claim is a single
//! put-if-absent against the backing, never a check-then-write, so
//! any number of concurrent publishers across any number of processes
//! race safely.

use std::collections::BTreeSet;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use berth_core::{is_strictly_greater, sort_versions_desc, validate_entity, Entity};

use crate::error::{Result, StoreError};
use crate::traits::{Backing, ClaimResult};

/// Key namespace in the backing store.
mod keys {
    pub const PACKAGES: &str = "packages";
    pub const TOKENS: &str = "tokens";

    pub fn entity(id: &str, version: &str) -> String {
        format!("entity:{id}:{version}")
    }

    pub fn versions(id: &str) -> String {
        format!("versions:{id}")
    }

    pub fn provides(tag: &str) -> String {
        format!("provides:{tag}")
    }

    pub fn requires(tag: &str) -> String {
        format!("requires:{tag}")
    }

    pub fn token(token: &str) -> String {
        format!("token:{token}")
    }

    pub fn latest(id: &str) -> String {
        format!("latest:{id}")
    }
}

/// One immutable stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntity {
    pub entity: Entity,
    /// Unix milliseconds at which the claim succeeded.
    pub created_at: i64,
    /// Canonical JCS bytes, kept verbatim for external re-verification.
    pub canonical: String,
}

/// Derived per-package aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub id: String,
    pub name: String,
    pub latest_version: String,
}

/// One row of a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub version: String,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
}

/// The storage engine for published entities.
pub struct EntityStore<B: Backing> {
    backing: B,
}

impl<B: Backing> EntityStore<B> {
    /// Create a store over the given backing.
    pub fn new(backing: B) -> Self {
        Self { backing }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Path
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist one immutable `(package, version)` record.
    ///
    /// Validation completes before any write; the claim is atomic; index
    /// fan-out happens only after the claim succeeds. Exactly one of any
    /// N concurrent callers for the same key succeeds, the rest observe
    /// [`StoreError::AlreadyExists`] with no side effects.
    pub async fn store(&self, entity: &Entity, canonical: &[u8]) -> Result<StoredEntity> {
        validate_entity(entity)?;

        let id = entity.id().to_string();
        let version = entity.version().to_string();

        let record = StoredEntity {
            entity: entity.clone(),
            created_at: now_millis(),
            canonical: String::from_utf8(canonical.to_vec())
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
        };
        let value =
            serde_json::to_vec(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;

        // The primary claim: a single set-if-absent against the backing.
        match self
            .backing
            .put_if_absent(&keys::entity(&id, &version), value.into())
            .await?
        {
            ClaimResult::Claimed => {}
            ClaimResult::Lost => return Err(StoreError::AlreadyExists { id, version }),
        }
        tracing::debug!(%id, %version, "claimed entity key");

        // ListVersions/ListPackages correctness requires these two index
        // entries; they are retried once and their failure surfaces.
        self.set_add_required(&keys::versions(&id), &version).await?;
        self.set_add_required(keys::PACKAGES, &id).await?;

        // The remaining fan-out steps are independent and best-effort: a
        // failure leaves a fully readable record behind.
        self.fan_out_indexes(&record.entity).await;

        Ok(record)
    }

    /// Append to a mandatory index, retrying once before surfacing.
    async fn set_add_required(&self, key: &str, member: &str) -> Result<()> {
        if let Err(first) = self.backing.set_add(key, member).await {
            tracing::warn!(key, error = %first, "mandatory index append failed, retrying");
            self.backing.set_add(key, member).await?;
        }
        Ok(())
    }

    async fn set_add_best_effort(&self, key: &str, member: &str) {
        if let Err(e) = self.backing.set_add(key, member).await {
            tracing::warn!(key, member, error = %e, "index append failed");
        }
    }

    async fn fan_out_indexes(&self, entity: &Entity) {
        let member = entity.key().to_string();

        for tag in entity.provides() {
            self.set_add_best_effort(&keys::provides(tag), &member).await;
        }
        for tag in entity.requires() {
            self.set_add_best_effort(&keys::requires(tag), &member).await;
        }

        for token in search_tokens(entity) {
            self.set_add_best_effort(keys::TOKENS, &token).await;
            self.set_add_best_effort(&keys::token(&token), &member).await;
        }

        if let Err(e) = self.update_latest(entity).await {
            tracing::warn!(id = %entity.id(), error = %e, "latest-version aggregate update failed");
        }
    }

    /// Advance the package aggregate when the new version is
    /// semver-greater than the recorded latest.
    async fn update_latest(&self, entity: &Entity) -> Result<()> {
        let key = keys::latest(entity.id());
        let current: Option<PackageSummary> = match self.backing.get(&key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).ok(),
            None => None,
        };
        let advances = match &current {
            Some(summary) => is_strictly_greater(entity.version(), &summary.latest_version),
            None => true,
        };
        if advances {
            let summary = PackageSummary {
                id: entity.id().to_string(),
                name: entity.display_name().to_string(),
                latest_version: entity.version().to_string(),
            };
            let value = serde_json::to_vec(&summary)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            self.backing.put(&key, value.into()).await?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch one stored record.
    pub async fn get(&self, id: &str, version: &str) -> Result<StoredEntity> {
        let bytes = self
            .backing
            .get(&keys::entity(id, version))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{id}@{version}")))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Whether a record exists for the key.
    pub async fn has(&self, id: &str, version: &str) -> Result<bool> {
        Ok(self.backing.get(&keys::entity(id, version)).await?.is_some())
    }

    /// The stored canonical bytes of one record.
    pub async fn canonical_bytes(&self, id: &str, version: &str) -> Result<Bytes> {
        let record = self.get(id, version).await?;
        Ok(Bytes::from(record.canonical.into_bytes()))
    }

    /// All versions of a package, descending by semver precedence.
    ///
    /// Versions that fail to parse sort after valid ones.
    pub async fn list_versions(&self, id: &str) -> Result<Vec<String>> {
        let mut versions = self.backing.set_members(&keys::versions(id)).await?;
        if versions.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        sort_versions_desc(&mut versions);
        Ok(versions)
    }

    /// All known package ids, sorted.
    pub async fn list_packages(&self) -> Result<Vec<String>> {
        let mut ids = self.backing.set_members(keys::PACKAGES).await?;
        ids.sort();
        Ok(ids)
    }

    /// The derived aggregate for a package, if any version was stored.
    pub async fn package_summary(&self, id: &str) -> Result<Option<PackageSummary>> {
        match self.backing.get(&keys::latest(id)).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Entities whose provides list contains the given tag.
    pub async fn providers_of(&self, tag: &str) -> Result<Vec<String>> {
        self.backing.set_members(&keys::provides(tag)).await
    }

    /// Entities whose requires list contains the given tag.
    pub async fn dependents_on(&self, tag: &str) -> Result<Vec<String>> {
        self.backing.set_members(&keys::requires(tag)).await
    }

    /// Case-insensitive substring search over id, name, provides, and
    /// requires. Returns an empty list, never an error, on no match.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let needle = query.to_lowercase();
        let tokens = self.backing.set_members(keys::TOKENS).await?;

        let mut members = BTreeSet::new();
        for token in tokens.iter().filter(|t| t.contains(&needle)) {
            members.extend(self.backing.set_members(&keys::token(token)).await?);
        }

        let mut hits = Vec::with_capacity(members.len());
        for member in members {
            let Some((id, version)) = member.split_once('@') else {
                continue;
            };
            match self.get(id, version).await {
                Ok(record) => hits.push(SearchHit {
                    id: id.to_string(),
                    version: version.to_string(),
                    provides: record.entity.provides().to_vec(),
                    requires: record.entity.requires().to_vec(),
                }),
                // A token index entry may briefly outrun a failed write.
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(hits)
    }
}

/// Lowercased searchable tokens of an entity.
fn search_tokens(entity: &Entity) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    tokens.insert(entity.id().to_lowercase());
    tokens.insert(entity.display_name().to_lowercase());
    for tag in entity.provides() {
        tokens.insert(tag.to_lowercase());
    }
    for tag in entity.requires() {
        tokens.insert(tag.to_lowercase());
    }
    tokens
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBacking;
    use berth_core::{canonical_bytes, Artifact, Manifest};

    fn manifest(id: &str, version: &str) -> Entity {
        Entity::Manifest(Manifest {
            id: id.into(),
            name: format!("{id} display"),
            version: version.into(),
            chains: vec![],
            artifact: Artifact {
                kind: "wasm".into(),
                target: "wasm32-wasi".into(),
                digest: format!("sha256:{}", "0".repeat(64)),
                uri: "https://artifacts.example.com/a.wasm".into(),
            },
            provides: vec!["cache.kv@1".into()],
            requires: vec!["log.sink@1".into()],
            dependencies: vec![],
            signature: None,
        })
    }

    async fn store_entity(store: &EntityStore<MemoryBacking>, entity: &Entity) -> Result<StoredEntity> {
        let canonical = canonical_bytes(entity).unwrap();
        store.store(entity, &canonical).await
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let store = EntityStore::new(MemoryBacking::new());
        let entity = manifest("com.example.app", "1.0.0");

        let record = store_entity(&store, &entity).await.unwrap();
        assert!(record.created_at > 0);

        let fetched = store.get("com.example.app", "1.0.0").await.unwrap();
        assert_eq!(fetched.entity.id(), "com.example.app");
        assert_eq!(fetched.canonical, record.canonical);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = EntityStore::new(MemoryBacking::new());
        let entity = manifest("com.example.app", "1.0.0");

        store_entity(&store, &entity).await.unwrap();
        let err = store_entity(&store, &entity).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_invalid_entity_writes_nothing() {
        let store = EntityStore::new(MemoryBacking::new());
        let mut entity = manifest("com.example.app", "1.0.0");
        if let Entity::Manifest(m) = &mut entity {
            m.version = "not-semver".into();
        }

        assert!(matches!(
            store_entity(&store, &entity).await,
            Err(StoreError::InvalidEntity(_))
        ));
        assert!(!store.has("com.example.app", "not-semver").await.unwrap());
        assert!(store.list_packages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_versions_descending() {
        let store = EntityStore::new(MemoryBacking::new());
        for version in ["1.0.0-alpha.1", "1.0.0", "1.0.0-rc.1"] {
            store_entity(&store, &manifest("com.example.app", version))
                .await
                .unwrap();
        }

        let versions = store.list_versions("com.example.app").await.unwrap();
        assert_eq!(versions, vec!["1.0.0", "1.0.0-rc.1", "1.0.0-alpha.1"]);
    }

    #[tokio::test]
    async fn test_list_versions_unknown_package() {
        let store = EntityStore::new(MemoryBacking::new());
        assert!(matches!(
            store.list_versions("com.example.ghost").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_aggregate_only_advances() {
        let store = EntityStore::new(MemoryBacking::new());

        store_entity(&store, &manifest("com.example.app", "1.1.0"))
            .await
            .unwrap();
        store_entity(&store, &manifest("com.example.app", "1.0.0"))
            .await
            .unwrap();

        let summary = store
            .package_summary("com.example.app")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.latest_version, "1.1.0");

        store_entity(&store, &manifest("com.example.app", "2.0.0"))
            .await
            .unwrap();
        let summary = store
            .package_summary("com.example.app")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.latest_version, "2.0.0");
    }

    #[tokio::test]
    async fn test_interface_reverse_indexes() {
        let store = EntityStore::new(MemoryBacking::new());
        store_entity(&store, &manifest("com.example.app", "1.0.0"))
            .await
            .unwrap();

        assert_eq!(
            store.providers_of("cache.kv@1").await.unwrap(),
            vec!["com.example.app@1.0.0"]
        );
        assert_eq!(
            store.dependents_on("log.sink@1").await.unwrap(),
            vec!["com.example.app@1.0.0"]
        );
        assert!(store.providers_of("other@1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_substrings_case_insensitive() {
        let store = EntityStore::new(MemoryBacking::new());
        store_entity(&store, &manifest("com.example.app", "1.0.0"))
            .await
            .unwrap();

        // By id fragment.
        let hits = store.search("EXAMPLE").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "com.example.app");
        assert_eq!(hits[0].provides, vec!["cache.kv@1"]);

        // By provided interface fragment.
        let hits = store.search("cache.kv").await.unwrap();
        assert_eq!(hits.len(), 1);

        // No match is empty, not an error.
        assert!(store.search("zzz-nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_store_single_winner() {
        use std::sync::Arc;

        let store = Arc::new(EntityStore::new(MemoryBacking::new()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let entity = manifest("com.example.race", "1.0.0");
                let canonical = canonical_bytes(&entity).unwrap();
                store.store(&entity, &canonical).await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::AlreadyExists { .. }) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 7);

        // The winner's record is fully indexed.
        let versions = store.list_versions("com.example.race").await.unwrap();
        assert_eq!(versions, vec!["1.0.0"]);
        assert_eq!(store.list_packages().await.unwrap(), vec!["com.example.race"]);
    }
}

//! Read-through, write-invalidated cache for resolution results.
//!
//! Entries are keyed by `(root id, root version, installed-set hash)`
//! and record every package id the resolution read. A fresh `store()`
//! for a package invalidates all entries that touched that id, so
//! staleness never persists past the next write to an implicated
//! package. The cache is never authoritative: a miss always falls
//! through to a fresh walk over the store.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use berth_core::Sha256Hash;

use crate::error::Result;
use crate::resolver::{DependencyProvider, EntityMeta, PlanEntry, Resolution};

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    root_id: String,
    root_version: String,
    installed_hash: Sha256Hash,
}

struct CacheEntry {
    resolution: Resolution,
    /// Every package id this resolution read.
    touched: HashSet<String>,
}

/// In-process resolution cache.
pub struct ResolutionCache {
    inner: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a cached resolution.
    pub fn lookup(
        &self,
        root_id: &str,
        root_version: &str,
        installed: &[PlanEntry],
    ) -> Option<Resolution> {
        let key = cache_key(root_id, root_version, installed);
        let inner = self.inner.read().unwrap();
        inner.get(&key).map(|entry| entry.resolution.clone())
    }

    /// Record a resolution along with the package ids it read.
    pub fn insert(
        &self,
        root_id: &str,
        root_version: &str,
        installed: &[PlanEntry],
        resolution: Resolution,
        touched: HashSet<String>,
    ) {
        let key = cache_key(root_id, root_version, installed);
        let mut inner = self.inner.write().unwrap();
        inner.insert(
            key,
            CacheEntry {
                resolution,
                touched,
            },
        );
    }

    /// Drop every entry whose resolution read the given package id.
    pub fn invalidate_package(&self, id: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.retain(|_, entry| !entry.touched.contains(id));
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash of the installed set, order-insensitive.
fn cache_key(root_id: &str, root_version: &str, installed: &[PlanEntry]) -> CacheKey {
    let mut lines: Vec<String> = installed
        .iter()
        .map(|entry| format!("{}@{}", entry.id, entry.version))
        .collect();
    lines.sort_unstable();
    let joined = lines.join("\n");
    CacheKey {
        root_id: root_id.to_string(),
        root_version: root_version.to_string(),
        installed_hash: Sha256Hash::hash(joined.as_bytes()),
    }
}

/// Provider wrapper that records every package id read through it, so
/// the cache knows what a resolution depends on.
pub struct TouchTracker<'a, P> {
    inner: &'a P,
    touched: Mutex<HashSet<String>>,
}

impl<'a, P> TouchTracker<'a, P> {
    pub fn new(inner: &'a P) -> Self {
        Self {
            inner,
            touched: Mutex::new(HashSet::new()),
        }
    }

    /// Consume the tracker, yielding the ids it saw.
    pub fn into_touched(self) -> HashSet<String> {
        self.touched.into_inner().unwrap()
    }

    fn record(&self, id: &str) {
        self.touched.lock().unwrap().insert(id.to_string());
    }
}

#[async_trait]
impl<P: DependencyProvider> DependencyProvider for TouchTracker<'_, P> {
    async fn versions_of(&self, id: &str) -> Result<Vec<String>> {
        self.record(id);
        self.inner.versions_of(id).await
    }

    async fn entity_meta(&self, id: &str, version: &str) -> Result<Option<EntityMeta>> {
        self.record(id);
        self.inner.entity_meta(id, version).await
    }
}

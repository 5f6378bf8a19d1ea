//! In-memory implementation of the Backing trait.
//!
//! This is primarily for testing. It has the same claim semantics as
//! the networked keyed store but keeps everything in memory.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::traits::{Backing, ClaimResult};

/// In-memory backing. All data is lost when dropped. Thread-safe via
/// RwLock; the claim happens under a single write-lock acquisition.
pub struct MemoryBacking {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    values: HashMap<String, Bytes>,
    sets: HashMap<String, BTreeSet<String>>,
}

impl MemoryBacking {
    /// Create a new empty backing.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner::default()),
        }
    }
}

impl Default for MemoryBacking {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backing for MemoryBacking {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.values.get(key).cloned())
    }

    async fn put_if_absent(&self, key: &str, value: Bytes) -> Result<ClaimResult> {
        let mut inner = self.inner.write().unwrap();
        if inner.values.contains_key(key) {
            return Ok(ClaimResult::Lost);
        }
        inner.values.insert(key.to_string(), value);
        Ok(ClaimResult::Claimed)
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_then_lose() {
        let backing = MemoryBacking::new();
        let first = backing
            .put_if_absent("k", Bytes::from_static(b"a"))
            .await
            .unwrap();
        assert_eq!(first, ClaimResult::Claimed);

        let second = backing
            .put_if_absent("k", Bytes::from_static(b"b"))
            .await
            .unwrap();
        assert_eq!(second, ClaimResult::Lost);

        // The loser's value must not be visible.
        let stored = backing.get("k").await.unwrap().unwrap();
        assert_eq!(&stored[..], b"a");
    }

    #[tokio::test]
    async fn test_set_add_idempotent() {
        let backing = MemoryBacking::new();
        backing.set_add("s", "m").await.unwrap();
        backing.set_add("s", "m").await.unwrap();
        assert_eq!(backing.set_members("s").await.unwrap(), vec!["m"]);
    }

    #[tokio::test]
    async fn test_missing_keys() {
        let backing = MemoryBacking::new();
        assert!(backing.get("missing").await.unwrap().is_none());
        assert!(backing.set_members("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        use std::sync::Arc;

        let backing = Arc::new(MemoryBacking::new());
        let mut handles = Vec::new();
        for i in 0..16u8 {
            let backing = Arc::clone(&backing);
            handles.push(tokio::spawn(async move {
                backing.put_if_absent("race", Bytes::from(vec![i])).await
            }));
        }

        let mut claimed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == ClaimResult::Claimed {
                claimed += 1;
            }
        }
        assert_eq!(claimed, 1);
    }
}

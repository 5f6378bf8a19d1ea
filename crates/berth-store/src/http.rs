//! Networked keyed-store client.
//!
//! Speaks a minimal HTTP key/value protocol against the external keyed
//! store:
//!
//! - `GET  {base}/kv?key=K`              → 200 value bytes | 404
//! - `PUT  {base}/kv?key=K&nx=true`      → 201 claimed | 409 already set
//! - `PUT  {base}/kv?key=K`              → 200/201 written
//! - `POST {base}/sets?key=K&member=M`   → 200/201 added (idempotent)
//! - `GET  {base}/sets?key=K`            → 200 JSON string array
//!
//! The `nx=true` claim is executed server-side as a single
//! compare-and-set; this client never emulates it with a read. Every
//! call is bounded by a timeout and surfaces failures as retryable
//! [`StoreError::Unavailable`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

use crate::error::{Result, StoreError};
use crate::traits::{Backing, ClaimResult};

/// Default bound for one keyed-store round-trip.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Keyed-store client over HTTP.
pub struct HttpBacking {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBacking {
    /// Create a client for the keyed store at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_CALL_TIMEOUT)
    }

    /// Create a client with an explicit per-call timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Run one round-trip under the configured timeout.
    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, reqwest::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Unavailable(format!(
                "keyed store call exceeded {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl Backing for HttpBacking {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let request = self.client.get(self.endpoint("kv")).query(&[("key", key)]);
        let response = self.bounded(request.send()).await?;
        let status = response.status();
        if status == StatusCode::OK {
            Ok(Some(self.bounded(response.bytes()).await?))
        } else if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(StoreError::Internal(format!(
                "keyed store returned {status} for get"
            )))
        }
    }

    async fn put_if_absent(&self, key: &str, value: Bytes) -> Result<ClaimResult> {
        let request = self
            .client
            .put(self.endpoint("kv"))
            .query(&[("key", key), ("nx", "true")])
            .body(value);
        let response = self.bounded(request.send()).await?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            Ok(ClaimResult::Claimed)
        } else if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            Ok(ClaimResult::Lost)
        } else {
            Err(StoreError::Internal(format!(
                "keyed store returned {status} for conditional put"
            )))
        }
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        let request = self
            .client
            .put(self.endpoint("kv"))
            .query(&[("key", key)])
            .body(value);
        let response = self.bounded(request.send()).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Internal(format!(
                "keyed store returned {} for put",
                response.status()
            )))
        }
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        let request = self
            .client
            .post(self.endpoint("sets"))
            .query(&[("key", key), ("member", member)]);
        let response = self.bounded(request.send()).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Internal(format!(
                "keyed store returned {} for set add",
                response.status()
            )))
        }
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let request = self
            .client
            .get(self.endpoint("sets"))
            .query(&[("key", key)]);
        let response = self.bounded(request.send()).await?;
        let status = response.status();
        if status == StatusCode::OK {
            let body = self.bounded(response.bytes()).await?;
            serde_json::from_slice(&body).map_err(|e| StoreError::Serialization(e.to_string()))
        } else if status == StatusCode::NOT_FOUND {
            Ok(Vec::new())
        } else {
            Err(StoreError::Internal(format!(
                "keyed store returned {status} for set members"
            )))
        }
    }
}

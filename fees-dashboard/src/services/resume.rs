//! Redirect-resumption marker store.
//!
//! When checkout leaves the application through a full-page redirect, the
//! return handler prepares the receipt payload server-side and keys it by
//! order id with a short TTL. The page that receives the redirect consumes
//! the marker exactly once; a reload after that finds nothing and falls
//! back to re-verification. This replaces a cookie-based side channel with
//! its size limits and manual clearing.

use crate::error::FeeError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Store a pending receipt payload for one order id.
    async fn put(&self, order_id: &str, payload: &[u8], ttl: Duration) -> Result<(), FeeError>;

    /// Consume the payload for one order id. Single-use: a second take for
    /// the same order id returns `None`.
    async fn take(&self, order_id: &str) -> Result<Option<Vec<u8>>, FeeError>;
}

fn marker_key(order_id: &str) -> String {
    format!("receipt:{}", order_id)
}

/// Redis-backed marker store with TTL expiry and atomic consume (GETDEL).
#[derive(Clone)]
pub struct RedisResumeStore {
    client: redis::Client,
}

impl RedisResumeStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResumeStore for RedisResumeStore {
    async fn put(&self, order_id: &str, payload: &[u8], ttl: Duration) -> Result<(), FeeError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| FeeError::Resume(e.into()))?;

        let encoded = general_purpose::STANDARD.encode(payload);
        let _: () = redis::cmd("SET")
            .arg(marker_key(order_id))
            .arg(encoded)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut con)
            .await
            .map_err(|e| FeeError::Resume(e.into()))?;

        tracing::debug!(order_id = %order_id, bytes = payload.len(), "resume marker stored");
        Ok(())
    }

    async fn take(&self, order_id: &str) -> Result<Option<Vec<u8>>, FeeError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| FeeError::Resume(e.into()))?;

        let encoded: Option<String> = redis::cmd("GETDEL")
            .arg(marker_key(order_id))
            .query_async(&mut con)
            .await
            .map_err(|e| FeeError::Resume(e.into()))?;

        match encoded {
            Some(value) => {
                let payload = general_purpose::STANDARD
                    .decode(value)
                    .map_err(|e| FeeError::Resume(e.into()))?;
                tracing::info!(order_id = %order_id, "resume marker consumed");
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }
}

/// In-process marker store for tests and single-node setups.
#[derive(Default)]
pub struct MemoryResumeStore {
    entries: DashMap<String, (Vec<u8>, Instant)>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn put(&self, order_id: &str, payload: &[u8], ttl: Duration) -> Result<(), FeeError> {
        // Markers for redirects that never return would otherwise pile up
        // until process exit; Redis handles this with its own TTL expiry.
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.1 > now);

        self.entries
            .insert(marker_key(order_id), (payload.to_vec(), now + ttl));
        Ok(())
    }

    async fn take(&self, order_id: &str) -> Result<Option<Vec<u8>>, FeeError> {
        match self.entries.remove(&marker_key(order_id)) {
            Some((_, (payload, deadline))) if Instant::now() <= deadline => Ok(Some(payload)),
            _ => Ok(None),
        }
    }
}

//! Fail-open cache store.
//!
//! [`CacheStore`] is the only way the rest of the system touches the cache.
//! Reads never fail: transport errors, timeouts and undecodable payloads all
//! surface as a miss. Writes and deletes are best-effort. A cache outage
//! therefore costs latency, never correctness, because the source of truth is
//! consulted on every miss.

use crate::backend::{CacheBackend, CacheError, NullBackend};
use crate::keys::CacheKey;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default bound on a single cache round trip.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(250);

/// Envelope stored for every cached value. The absolute expiry lets a hit
/// report its remaining freshness without asking the backend for the TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub expires_at_ms: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            value,
            expires_at_ms: Utc::now().timestamp_millis().saturating_add(ttl_ms),
        }
    }

    /// Time left before expiry, or `None` once expired.
    pub fn remaining(&self) -> Option<Duration> {
        let left = self.expires_at_ms - Utc::now().timestamp_millis();
        (left > 0).then(|| Duration::from_millis(left as u64))
    }
}

/// Whether a read was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }

    pub fn is_hit(self) -> bool {
        self == Self::Hit
    }
}

/// A value together with where it came from and how long it stays fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    pub status: CacheStatus,
    pub remaining: Duration,
}

impl<T> Lookup<T> {
    pub fn hit(value: T, remaining: Duration) -> Self {
        Self {
            value,
            status: CacheStatus::Hit,
            remaining,
        }
    }

    pub fn miss(value: T, ttl: Duration) -> Self {
        Self {
            value,
            status: CacheStatus::Miss,
            remaining: ttl,
        }
    }
}

/// Cache client over a pluggable backend.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    op_timeout: Duration,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.backend.name())
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
        }
    }

    /// A store that never caches anything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullBackend), DEFAULT_OP_TIMEOUT)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_enabled()
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .unwrap_or(Err(CacheError::Timeout(self.op_timeout)))
    }

    /// Reads the raw serialized envelope. Failures are logged and reported
    /// as a miss.
    pub async fn get_raw(&self, key: &CacheKey) -> Option<String> {
        match self.bounded(self.backend.get(key.as_str())).await {
            Ok(Some(raw)) => Some(raw),
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(cache.key = %key, cache.backend = self.backend.name(), error = %e, "Cache GET failed, treating as miss");
                None
            }
        }
    }

    /// Reads a value, returning it with its remaining TTL.
    pub async fn get<T>(&self, key: &CacheKey) -> Option<(T, Duration)>
    where
        T: DeserializeOwned,
    {
        let raw = self.get_raw(key).await?;
        decode_entry(key, &raw)
    }

    /// Writes a raw serialized envelope. Failures are logged and dropped.
    pub async fn set_raw(&self, key: &CacheKey, raw: String, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        match self.bounded(self.backend.set(key.as_str(), raw, ttl)).await {
            Ok(()) => debug!(cache.key = %key, cache.ttl_secs = ttl.as_secs(), "Cache set"),
            Err(e) => {
                warn!(cache.key = %key, cache.backend = self.backend.name(), error = %e, "Cache SET failed, skipping")
            }
        }
    }

    /// Stores a value for `ttl`.
    pub async fn set<T>(&self, key: &CacheKey, value: &T, ttl: Duration)
    where
        T: Serialize,
    {
        if let Some(raw) = encode_entry(key, value, ttl) {
            self.set_raw(key, raw, ttl).await;
        }
    }

    /// Deletes one key and reports whether it existed. Unlike reads, a failed
    /// delete is returned: the entry may still be live and the caller has to
    /// invalidate some other way.
    pub async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.bounded(self.backend.delete(key.as_str()))
            .await
            .inspect(|removed| debug!(cache.key = %key, removed, "Cache invalidated"))
            .inspect_err(|e| {
                error!(cache.key = %key, cache.backend = self.backend.name(), error = %e, "Cache DEL failed")
            })
    }

    /// Deletes every key matching a glob. Administrative only: the cost is
    /// proportional to the keyspace, so it is not bounded by the operation
    /// timeout and errors are returned to the caller.
    pub async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let deleted = self.backend.delete_pattern(pattern).await?;
        debug!(cache.pattern = %pattern, cache.deleted = deleted, "Pattern purge complete");
        Ok(deleted)
    }

    pub async fn get_counter(&self, key: &str) -> Result<Option<i64>, CacheError> {
        self.bounded(self.backend.get_counter(key)).await
    }

    pub async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        self.bounded(self.backend.incr(key)).await
    }
}

pub(crate) fn encode_entry<T: Serialize>(key: &CacheKey, value: &T, ttl: Duration) -> Option<String> {
    match serde_json::to_string(&CacheEntry::new(value, ttl)) {
        Ok(raw) => Some(raw),
        Err(e) => {
            error!(cache.key = %key, error = %e, "Failed to serialize value for cache");
            None
        }
    }
}

pub(crate) fn decode_entry<T: DeserializeOwned>(key: &CacheKey, raw: &str) -> Option<(T, Duration)> {
    match serde_json::from_str::<CacheEntry<T>>(raw) {
        Ok(entry) => {
            let remaining = entry.remaining()?;
            Some((entry.value, remaining))
        }
        Err(e) => {
            error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
            None
        }
    }
}

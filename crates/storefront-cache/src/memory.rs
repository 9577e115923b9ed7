//! In-process backend built on moka.
//!
//! Used for single-instance deployments, local development and tests. Each
//! entry carries its own TTL.

use crate::backend::{CacheBackend, CacheError, glob_match};
use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredValue {
    payload: String,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MemoryBackend {
    entries: Cache<String, StoredValue>,
    counters: DashMap<String, i64>,
}

impl MemoryBackend {
    pub fn new(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .name("storefront-cache")
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            entries,
            counters: DashMap::new(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("entry_count", &self.entries.entry_count())
            .field("counters", &self.counters.len())
            .finish()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|stored| stored.payload))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(
                key.to_string(),
                StoredValue {
                    payload: value,
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let removed = self.entries.remove(key).await.is_some();
        let counter_removed = self.counters.remove(key).is_some();
        Ok(removed || counter_removed)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        let mut deleted = 0;
        for key in matching {
            if self.entries.remove(&key).await.is_some() {
                deleted += 1;
            }
        }

        let before = self.counters.len();
        self.counters.retain(|key, _| !glob_match(pattern, key));
        deleted += (before - self.counters.len()) as u64;

        Ok(deleted)
    }

    async fn get_counter(&self, key: &str) -> Result<Option<i64>, CacheError> {
        Ok(self.counters.get(key).map(|value| *value))
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        // The entry guard holds the shard lock, so the add is atomic.
        let mut counter = self.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_and_get() {
        let backend = MemoryBackend::default();
        backend
            .set("ns:product:v0:1", "one".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            backend.get("ns:product:v0:1").await.unwrap().as_deref(),
            Some("one")
        );
        assert!(backend.get("ns:product:v0:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let backend = MemoryBackend::default();
        backend
            .set("short", "v".into(), Duration::from_millis(200))
            .await
            .unwrap();
        backend
            .set("long", "v".into(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(backend.get("short").await.unwrap().is_none());
        assert!(backend.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_pattern_spares_other_classes() {
        let backend = MemoryBackend::default();
        for i in 0..3 {
            backend
                .set(&format!("ns:search:v0:{i}"), "[]".into(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        backend
            .set("ns:product:v0:1", "{}".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(backend.delete_pattern("ns:search:*").await.unwrap(), 3);
        assert!(backend.get("ns:product:v0:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_incr_is_atomic() {
        let backend = Arc::new(MemoryBackend::default());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.incr("ns:__version:product").await.unwrap()
            }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=64).collect::<Vec<i64>>());
        assert_eq!(
            backend.get_counter("ns:__version:product").await.unwrap(),
            Some(64)
        );
    }
}

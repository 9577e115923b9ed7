//! Redis backend for distributed caching.

use crate::backend::{CacheBackend, CacheError};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, instrument};

/// Keys fetched per SCAN round trip during pattern deletion.
const SCAN_BATCH: usize = 100;

/// Redis backend with a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL is invalid or the initial
    /// connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX rejects zero; sub-second TTLs round up to one second.
        let secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, secs).await?;

        debug!(cache.key = %key, cache.ttl_secs = secs, "Cache set");
        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    /// Uses SCAN, which is safe for production but O(keyspace).
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = deleted, "Pattern invalidation complete");
        Ok(deleted)
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get_counter(&self, key: &str) -> Result<Option<i64>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<i64>>(key).await?)
    }

    #[instrument(skip(self), fields(cache.operation = "INCR"))]
    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr::<_, _, i64>(key, 1).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Require a running Redis instance:
    // REDIS_URL=redis://localhost:6379 cargo test -- --ignored

    async fn backend() -> RedisBackend {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        RedisBackend::connect(&url).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_get_delete() {
        let backend = backend().await;

        backend
            .set("storefront-test:product:v0:1", "{\"id\":1}".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            backend.get("storefront-test:product:v0:1").await.unwrap().as_deref(),
            Some("{\"id\":1}")
        );
        assert!(backend.delete("storefront-test:product:v0:1").await.unwrap());
        assert!(backend.get("storefront-test:product:v0:1").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_incr_is_monotonic() {
        let backend = backend().await;
        let key = "storefront-test:__version:product";

        let first = backend.incr(key).await.unwrap();
        let second = backend.incr(key).await.unwrap();
        assert_eq!(second, first + 1);
        assert_eq!(backend.get_counter(key).await.unwrap(), Some(second));

        backend.delete(key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_delete_pattern() {
        let backend = backend().await;
        for i in 0..5 {
            backend
                .set(&format!("storefront-test:search:v0:{i}"), "[]".into(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        let deleted = backend.delete_pattern("storefront-test:search:*").await.unwrap();
        assert_eq!(deleted, 5);
    }
}

//! Fault-injecting backends for tests.

use crate::backend::{CacheBackend, CacheError};
use async_trait::async_trait;
use crate::memory::MemoryBackend;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Simulates a cache that cannot be reached: every operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableBackend;

#[async_trait]
impl CacheBackend for UnreachableBackend {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("connection refused"))
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("connection refused"))
    }

    async fn get_counter(&self, _key: &str) -> Result<Option<i64>, CacheError> {
        Err(CacheError::Unavailable("connection refused"))
    }

    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        Err(CacheError::Unavailable("connection refused"))
    }
}

/// Sleeps before answering every request as a miss.
#[derive(Debug, Clone, Copy)]
pub struct SlowBackend {
    delay: Duration,
}

impl SlowBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CacheBackend for SlowBackend {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        tokio::time::sleep(self.delay).await;
        Ok(0)
    }

    async fn get_counter(&self, _key: &str) -> Result<Option<i64>, CacheError> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        tokio::time::sleep(self.delay).await;
        Ok(1)
    }
}

/// In-memory backend that can be taken offline and brought back, to
/// exercise outage and recovery paths.
#[derive(Debug, Default)]
pub struct SwitchableBackend {
    inner: MemoryBackend,
    offline: AtomicBool,
}

impl SwitchableBackend {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("backend offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for SwitchableBackend {
    fn name(&self) -> &'static str {
        "switchable"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        self.check()?;
        self.inner.delete_pattern(pattern).await
    }

    async fn get_counter(&self, key: &str) -> Result<Option<i64>, CacheError> {
        self.check()?;
        self.inner.get_counter(key).await
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        self.check()?;
        self.inner.incr(key).await
    }
}

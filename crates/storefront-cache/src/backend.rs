//! Pluggable storage behind [`CacheStore`](crate::CacheStore).
//!
//! Backends report every failure; deciding what a failure means for the
//! caller (miss, no-op, fallback) is the store's job.

use async_trait::async_trait;
use std::time::Duration;

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(&'static str),
}

/// Remote key-value service operations needed by the cache layer.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// A name for logs and metrics, e.g. `redis`.
    fn name(&self) -> &'static str;

    /// Whether this backend actually stores anything.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Deletes every key matching a Redis-style glob. Returns the count.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    /// Reads an integer counter. Missing counters read as `None`.
    async fn get_counter(&self, key: &str) -> Result<Option<i64>, CacheError>;

    /// Atomically increments a counter and returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;
}

/// Backend used when no cache is configured: every read misses, every
/// write is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

#[async_trait]
impl CacheBackend for NullBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn get_counter(&self, _key: &str) -> Result<Option<i64>, CacheError> {
        Err(CacheError::Unavailable("no cache backend configured"))
    }

    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        Err(CacheError::Unavailable("no cache backend configured"))
    }
}

/// Redis-style glob matching: `*`, `?`, `[abc]`, `[a-z]`, `[^abc]` and `\`
/// escapes.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_at(&pattern, &text)
}

fn glob_match_at(pattern: &[char], text: &[char]) -> bool {
    let Some((&head, rest)) = pattern.split_first() else {
        return text.is_empty();
    };

    match head {
        '*' => (0..=text.len()).any(|skip| glob_match_at(rest, &text[skip..])),
        '?' => !text.is_empty() && glob_match_at(rest, &text[1..]),
        '[' => {
            let Some(close) = rest.iter().position(|&c| c == ']') else {
                return text.first() == Some(&'[') && glob_match_at(rest, &text[1..]);
            };
            let Some(&c) = text.first() else {
                return false;
            };
            let (negated, set) = match rest[..close].split_first() {
                Some((&'^', set)) | Some((&'!', set)) => (true, set),
                _ => (false, &rest[..close]),
            };
            if set_contains(set, c) != negated {
                glob_match_at(&rest[close + 1..], &text[1..])
            } else {
                false
            }
        }
        '\\' if !rest.is_empty() => {
            text.first() == Some(&rest[0]) && glob_match_at(&rest[1..], &text[1..])
        }
        literal => text.first() == Some(&literal) && glob_match_at(rest, &text[1..]),
    }
}

fn set_contains(set: &[char], c: char) -> bool {
    let mut i = 0;
    while i < set.len() {
        if i + 2 < set.len() && set[i + 1] == '-' {
            if set[i] <= c && c <= set[i + 2] {
                return true;
            }
            i += 3;
        } else {
            if set[i] == c {
                return true;
            }
            i += 1;
        }
    }
    false
}

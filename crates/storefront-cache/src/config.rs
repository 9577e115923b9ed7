//! Cache configuration.
//!
//! Loaded from environment variables at startup.

use crate::class::TtlPolicy;
use crate::keys::DEFAULT_NAMESPACE;
use crate::store::DEFAULT_OP_TIMEOUT;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Which store backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Redis,
    Memory,
    /// Caching disabled; every read goes to the source of truth.
    None,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "in-memory" => Ok(Self::Memory),
            "none" | "null" | "off" | "disabled" => Ok(Self::None),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
            Self::None => "none",
        })
    }
}

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `CACHE_BACKEND`: `redis`, `memory` or `none` (default: `redis`)
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_NAMESPACE`: key namespace (default: `storefront-v1`)
/// - `CACHE_OP_TIMEOUT_MS`: per-operation store timeout (default: `250`)
/// - `CACHE_MAX_ENTRIES`: capacity of the in-memory backend (default: `10000`)
/// - `CACHE_TTL_<CLASS>`: per-class TTL override in seconds
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub backend: BackendKind,
    pub redis_url: String,
    /// Prefix for all cache keys. Changing it orphans every existing entry.
    pub namespace: String,
    pub op_timeout: Duration,
    pub max_entries: u64,
    pub ttl_policy: TtlPolicy,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend = match env::var("CACHE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Invalid CACHE_BACKEND, falling back to {}", defaults.backend);
                defaults.backend
            }),
            Err(_) => defaults.backend,
        };

        Self {
            backend,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            namespace: env::var("CACHE_NAMESPACE").unwrap_or(defaults.namespace),
            op_timeout: env::var("CACHE_OP_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.op_timeout),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            ttl_policy: TtlPolicy::from_env(),
        }
    }

    /// In-memory configuration with default TTLs.
    pub fn in_memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            redis_url: "redis://127.0.0.1:6379".into(),
            namespace: DEFAULT_NAMESPACE.into(),
            op_timeout: DEFAULT_OP_TIMEOUT,
            max_entries: 10_000,
            ttl_policy: TtlPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("redis".parse::<BackendKind>(), Ok(BackendKind::Redis));
        assert_eq!(" Memory ".parse::<BackendKind>(), Ok(BackendKind::Memory));
        assert_eq!("none".parse::<BackendKind>(), Ok(BackendKind::None));
        assert_eq!("off".parse::<BackendKind>(), Ok(BackendKind::None));
        assert!("memcached".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, BackendKind::Redis);
        assert_eq!(config.namespace, "storefront-v1");
        assert_eq!(config.op_timeout, Duration::from_millis(250));
        assert_eq!(CacheConfig::in_memory().backend, BackendKind::Memory);
    }
}

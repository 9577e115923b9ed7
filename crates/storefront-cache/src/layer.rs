//! Assembly of the cache components around one store.

use crate::backend::{CacheBackend, NullBackend};
use crate::config::{BackendKind, CacheConfig};
use crate::invalidation::InvalidationDispatcher;
use crate::keys::{KeyBuilder, KeyError};
use crate::memory::MemoryBackend;
use crate::reader::CacheAsideReader;
use crate::redis::RedisBackend;
use crate::store::CacheStore;
use crate::versions::ResourceVersionTable;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on establishing the initial Redis connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything a request handler needs from the cache, sharing one store,
/// one key namespace and one version table.
#[derive(Debug, Clone)]
pub struct CacheLayer {
    pub store: CacheStore,
    pub keys: KeyBuilder,
    pub versions: Arc<ResourceVersionTable>,
    pub reader: Arc<CacheAsideReader>,
    pub dispatcher: Arc<InvalidationDispatcher>,
}

impl CacheLayer {
    /// Builds the layer over the configured backend.
    ///
    /// A Redis server that cannot be reached at startup is not fatal: the
    /// layer falls back to the null backend and every read goes to the
    /// source of truth.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the configured namespace is not a valid key
    /// segment.
    pub async fn connect(config: &CacheConfig) -> Result<Self, KeyError> {
        let backend: Arc<dyn CacheBackend> = match config.backend {
            BackendKind::Redis => {
                let connect = RedisBackend::connect(&config.redis_url);
                match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
                    Ok(Ok(redis)) => {
                        info!("Connected to Redis cache");
                        Arc::new(redis)
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "Redis unavailable, caching disabled");
                        Arc::new(NullBackend)
                    }
                    Err(_) => {
                        warn!(timeout = ?CONNECT_TIMEOUT, "Redis connection timed out, caching disabled");
                        Arc::new(NullBackend)
                    }
                }
            }
            BackendKind::Memory => Arc::new(MemoryBackend::new(config.max_entries)),
            BackendKind::None => Arc::new(NullBackend),
        };

        Self::with_backend(backend, config)
    }

    /// Builds the layer over an already constructed backend.
    pub fn with_backend(
        backend: Arc<dyn CacheBackend>,
        config: &CacheConfig,
    ) -> Result<Self, KeyError> {
        let keys = KeyBuilder::new(config.namespace.clone())?;
        let layer = Self::assemble(backend, keys, config);

        info!(
            cache.backend = layer.store.backend_name(),
            cache.namespace = layer.keys.namespace(),
            "Cache layer ready"
        );
        Ok(layer)
    }

    /// Layer over a fresh in-memory backend with default settings.
    pub fn in_memory() -> Self {
        let config = CacheConfig::in_memory();
        let backend = Arc::new(MemoryBackend::new(config.max_entries));
        Self::assemble(backend, KeyBuilder::default(), &config)
    }

    fn assemble(backend: Arc<dyn CacheBackend>, keys: KeyBuilder, config: &CacheConfig) -> Self {
        let store = CacheStore::new(backend, config.op_timeout);
        let versions = Arc::new(ResourceVersionTable::new(store.clone(), keys.clone()));

        let reader = Arc::new(CacheAsideReader::new(
            store.clone(),
            keys.clone(),
            versions.clone(),
            config.ttl_policy.clone(),
        ));
        let dispatcher = Arc::new(InvalidationDispatcher::new(
            store.clone(),
            keys.clone(),
            versions.clone(),
        ));

        Self {
            store,
            keys,
            versions,
            reader,
            dispatcher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceClass;
    use crate::keys::KeyParams;
    use crate::store::CacheStatus;

    #[tokio::test]
    async fn test_unreachable_redis_degrades_to_null() {
        let config = CacheConfig {
            backend: BackendKind::Redis,
            redis_url: "redis://127.0.0.1:1".into(),
            ..CacheConfig::default()
        };

        let layer = CacheLayer::connect(&config).await.unwrap();
        assert_eq!(layer.store.backend_name(), "none");
        assert!(!layer.store.is_enabled());
    }

    #[tokio::test]
    async fn test_invalid_namespace_rejected() {
        let config = CacheConfig {
            backend: BackendKind::None,
            namespace: "bad namespace".into(),
            ..CacheConfig::default()
        };

        assert!(CacheLayer::connect(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_components_share_the_store() {
        let layer = CacheLayer::in_memory();
        let params = KeyParams::id("42");

        let first = layer
            .reader
            .read_class(ResourceClass::ProductDetail, &params, || async {
                Ok::<_, KeyError>(1)
            })
            .await
            .unwrap();
        assert_eq!(first.status, CacheStatus::Miss);

        layer
            .dispatcher
            .on_mutation(ResourceClass::ProductDetail, Some(&["42".to_string()]))
            .await
            .unwrap();

        let second = layer
            .reader
            .read_class(ResourceClass::ProductDetail, &params, || async {
                Ok::<_, KeyError>(2)
            })
            .await
            .unwrap();
        assert_eq!((second.value, second.status), (2, CacheStatus::Miss));
    }
}

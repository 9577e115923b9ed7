use std::collections::BTreeMap;

use storefront_cache::{CacheLayer, InvalidationReport, ResourceClass};
use tracing::{info, instrument};

use crate::metrics::track_invalidation;
use crate::modules::cache_admin::model::{CacheStatsResponse, ClearCacheRequest, ClearMode};
use crate::modules::webhooks::model::InvalidationSummary;
use crate::utils::errors::AppError;

pub struct CacheAdminService;

impl CacheAdminService {
    /// Clears one class or all of them.
    ///
    /// Version mode follows the same cascade as a bulk write to the class.
    /// Purge mode deletes stored entries by pattern and fails with 503 when
    /// the store cannot be reached, since nothing was cleared.
    #[instrument(skip(cache))]
    pub async fn clear(
        cache: &CacheLayer,
        request: ClearCacheRequest,
    ) -> Result<InvalidationSummary, AppError> {
        let report = match (request.mode, request.class) {
            (ClearMode::Version, Some(class)) => {
                cache.dispatcher.on_mutation(class, None).await?
            }
            (ClearMode::Version, None) => {
                let mut report = InvalidationReport::default();
                for class in ResourceClass::ALL {
                    report
                        .bumped
                        .extend(cache.dispatcher.bump_class(class).await.bumped);
                }
                report
            }
            (ClearMode::Purge, Some(class)) => cache.dispatcher.purge_class(class).await?,
            (ClearMode::Purge, None) => cache.dispatcher.purge_all().await?,
        };

        let scope = request.class.map(ResourceClass::name).unwrap_or("all");
        track_invalidation("admin", scope);
        info!(scope, mode = ?request.mode, "Cache cleared by operator");

        Ok(report.into())
    }

    pub async fn stats(cache: &CacheLayer) -> CacheStatsResponse {
        let stats = cache.reader.stats();

        let mut versions = BTreeMap::new();
        for class in ResourceClass::ALL {
            versions.insert(
                class.name().to_string(),
                cache.versions.get_version(class).await,
            );
        }

        CacheStatsResponse {
            backend: cache.store.backend_name().to_string(),
            enabled: cache.store.is_enabled(),
            namespace: cache.keys.namespace().to_string(),
            hits: stats.hits,
            misses: stats.misses,
            coalesced: stats.coalesced,
            in_flight: stats.in_flight,
            versions,
        }
    }
}

use storefront_cache::CacheLayer;
use tracing::{info, instrument};

use crate::metrics::track_invalidation;
use crate::modules::webhooks::model::{InvalidationRequest, InvalidationSummary};
use crate::utils::errors::AppError;

pub struct WebhookService;

impl WebhookService {
    /// Applies an authenticated out-of-band invalidation. The sender has
    /// already committed its write, so this runs the same path as an
    /// in-process mutation.
    #[instrument(skip(cache))]
    pub async fn invalidate(
        cache: &CacheLayer,
        request: InvalidationRequest,
    ) -> Result<InvalidationSummary, AppError> {
        let ids = request.id.as_ref().map(|id| vec![id.to_string()]);
        let report = cache
            .dispatcher
            .on_mutation(request.resource, ids.as_deref())
            .await?;

        track_invalidation("webhook", request.resource.name());
        info!(
            cache.class = %request.resource,
            entity = ids.is_some(),
            "Webhook invalidation applied"
        );
        Ok(report.into())
    }
}

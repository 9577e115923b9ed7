use axum::{Json, extract::State};
use tracing::instrument;

use crate::middleware::auth::CacheAdmin;
use crate::modules::cache_admin::model::{CacheStatsResponse, ClearCacheRequest};
use crate::modules::cache_admin::service::CacheAdminService;
use crate::modules::webhooks::model::InvalidationSummary;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/admin/cache/clear",
    request_body = ClearCacheRequest,
    responses(
        (status = 200, description = "Cache cleared", body = InvalidationSummary),
        (status = 400, description = "Unknown class"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 503, description = "Cache store unavailable for purge")
    ),
    tag = "Cache Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn clear_cache(
    State(state): State<AppState>,
    _admin: CacheAdmin,
    ValidatedJson(request): ValidatedJson<ClearCacheRequest>,
) -> Result<Json<InvalidationSummary>, AppError> {
    let summary = CacheAdminService::clear(&state.cache, request).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/admin/cache/stats",
    responses(
        (status = 200, description = "Cache statistics", body = CacheStatsResponse),
        (status = 401, description = "Missing or invalid admin token")
    ),
    tag = "Cache Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn cache_stats(
    State(state): State<AppState>,
    _admin: CacheAdmin,
) -> Json<CacheStatsResponse> {
    Json(CacheAdminService::stats(&state.cache).await)
}

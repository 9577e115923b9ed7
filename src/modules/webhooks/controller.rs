use axum::{Json, extract::State};
use tracing::instrument;

use crate::middleware::auth::WebhookCaller;
use crate::modules::webhooks::model::{InvalidationRequest, InvalidationSummary};
use crate::modules::webhooks::service::WebhookService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/webhooks/invalidate",
    request_body = InvalidationRequest,
    responses(
        (status = 200, description = "Invalidation applied", body = InvalidationSummary),
        (status = 400, description = "Unknown resource type or malformed id"),
        (status = 401, description = "Missing or invalid bearer secret")
    ),
    tag = "Webhooks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _caller))]
pub async fn invalidate(
    State(state): State<AppState>,
    _caller: WebhookCaller,
    ValidatedJson(request): ValidatedJson<InvalidationRequest>,
) -> Result<Json<InvalidationSummary>, AppError> {
    let summary = WebhookService::invalidate(&state.cache, request).await?;
    Ok(Json(summary))
}

use axum::extract::{Query, State};
use storefront_cache::{Cached, ResourceClass};
use storefront_models::{SearchPage, SearchQuery};
use tracing::instrument;

use crate::modules::search::service::SearchService;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching products", body = SearchPage,
            headers(("X-Cache" = String, description = "HIT or MISS"))),
        (status = 400, description = "Malformed or repeated query parameter")
    ),
    tag = "Search"
)]
#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Cached<SearchPage>, AppError> {
    let lookup = SearchService::search(&state.cache, state.catalog.as_ref(), query).await?;
    Ok(Cached::new(ResourceClass::SearchResults, lookup))
}

use axum::extract::{Path, State};
use storefront_cache::{Cached, ResourceClass};
use storefront_models::CategoryFacets;
use tracing::instrument;

use crate::modules::facets::service::FacetService;
use crate::state::AppState;
use crate::utils::errors::AppError;

#[utoipa::path(
    get,
    path = "/api/categories/{slug}/facets",
    params(
        ("slug" = String, Path, description = "Category slug")
    ),
    responses(
        (status = 200, description = "Category facets", body = CategoryFacets,
            headers(("X-Cache" = String, description = "HIT or MISS"))),
        (status = 400, description = "Malformed slug"),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn get_category_facets(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Cached<CategoryFacets>, AppError> {
    let lookup = FacetService::category_facets(&state.cache, state.catalog.as_ref(), slug).await?;
    Ok(Cached::new(ResourceClass::CategoryFacets, lookup))
}

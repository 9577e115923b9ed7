use storefront_cache::{CacheLayer, KeyParams, Lookup, ResourceClass};
use storefront_models::{SearchPage, SearchQuery};
use tracing::instrument;

use crate::catalog::Catalog;
use crate::utils::errors::AppError;

/// Cache parameters for a search. Defaults are filled in and no-op filters
/// dropped, so every spelling of the same search shares one key.
pub fn search_key_params(query: &SearchQuery) -> KeyParams {
    KeyParams::query()
        .opt("q", query.text().map(str::to_lowercase))
        .opt("category", query.category.as_deref())
        .param("sort", query.sort().as_str())
        .opt("min_price", query.min_price)
        .opt("max_price", query.max_price)
        .opt("in_stock", query.in_stock.filter(|only| *only))
        .param("page", query.page())
        .param("per_page", query.per_page())
        .build()
}

pub struct SearchService;

impl SearchService {
    #[instrument(skip(cache, catalog))]
    pub async fn search(
        cache: &CacheLayer,
        catalog: &dyn Catalog,
        query: SearchQuery,
    ) -> Result<Lookup<SearchPage>, AppError> {
        let params = search_key_params(&query);
        cache
            .reader
            .read_class(ResourceClass::SearchResults, &params, || async move {
                Ok::<_, AppError>(catalog.search(&query).await?)
            })
            .await
    }
}

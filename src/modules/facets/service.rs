use storefront_cache::{CacheLayer, KeyParams, Lookup, ResourceClass};
use storefront_models::CategoryFacets;
use tracing::instrument;

use crate::catalog::Catalog;
use crate::utils::errors::AppError;

pub struct FacetService;

impl FacetService {
    /// Facets are an aggregate over the whole category and expensive to
    /// compute, which is why their TTL is the longest of the catalog reads.
    #[instrument(skip(cache, catalog))]
    pub async fn category_facets(
        cache: &CacheLayer,
        catalog: &dyn Catalog,
        slug: String,
    ) -> Result<Lookup<CategoryFacets>, AppError> {
        let params = KeyParams::id(&slug);
        cache
            .reader
            .read_class(ResourceClass::CategoryFacets, &params, || async move {
                Ok::<_, AppError>(catalog.category_facets(&slug).await?)
            })
            .await
    }
}

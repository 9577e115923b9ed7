use storefront_models::{
    CategoryFacets, InventoryLevel, PriceBucket, Product, SearchPage, SearchSort, StockCount,
    StockRecountDto, UpdatePriceDto, UpdateStockDto,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::cache_admin::model::{CacheStatsResponse, ClearCacheRequest, ClearMode};
use crate::modules::products::controller::RecountResponse;
use crate::modules::webhooks::model::{
    BumpedVersion, EntityId, InvalidationRequest, InvalidationSummary,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::products::controller::get_product,
        crate::modules::products::controller::get_inventory,
        crate::modules::products::controller::update_price,
        crate::modules::products::controller::update_stock,
        crate::modules::products::controller::recount_stock,
        crate::modules::search::controller::search_products,
        crate::modules::facets::controller::get_category_facets,
        crate::modules::webhooks::controller::invalidate,
        crate::modules::cache_admin::controller::clear_cache,
        crate::modules::cache_admin::controller::cache_stats,
    ),
    components(
        schemas(
            Product,
            InventoryLevel,
            UpdatePriceDto,
            UpdateStockDto,
            StockCount,
            StockRecountDto,
            RecountResponse,
            SearchSort,
            SearchPage,
            PriceBucket,
            CategoryFacets,
            EntityId,
            InvalidationRequest,
            BumpedVersion,
            InvalidationSummary,
            ClearMode,
            ClearCacheRequest,
            CacheStatsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Products", description = "Product detail, inventory and catalog writes"),
        (name = "Search", description = "Filtered product listings"),
        (name = "Categories", description = "Category facet aggregates"),
        (name = "Webhooks", description = "Out-of-band cache invalidation"),
        (name = "Cache Admin", description = "Operator cache controls")
    ),
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Read-heavy catalog API fronted by a shared cache-aside layer.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            )
        }
    }
}

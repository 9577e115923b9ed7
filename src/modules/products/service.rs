use storefront_cache::{CacheLayer, KeyParams, Lookup, ResourceClass};
use storefront_models::{InventoryLevel, Product, StockRecountDto};
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::utils::errors::AppError;

pub struct ProductService;

impl ProductService {
    #[instrument(skip(cache, catalog))]
    pub async fn get_product(
        cache: &CacheLayer,
        catalog: &dyn Catalog,
        id: i64,
    ) -> Result<Lookup<Product>, AppError> {
        cache
            .reader
            .read_class(ResourceClass::ProductDetail, &KeyParams::id(id), || async move {
                Ok::<_, AppError>(catalog.product(id).await?)
            })
            .await
    }

    #[instrument(skip(cache, catalog))]
    pub async fn get_inventory(
        cache: &CacheLayer,
        catalog: &dyn Catalog,
        id: i64,
    ) -> Result<Lookup<InventoryLevel>, AppError> {
        cache
            .reader
            .read_class(ResourceClass::InventoryCount, &KeyParams::id(id), || async move {
                Ok::<_, AppError>(catalog.inventory(id).await?)
            })
            .await
    }

    /// Prices feed listings and facets as well as the detail view, so a
    /// price change is treated as structural and bumps the class versions.
    #[instrument(skip(cache, catalog))]
    pub async fn update_price(
        cache: &CacheLayer,
        catalog: &dyn Catalog,
        id: i64,
        price_cents: i64,
    ) -> Result<Product, AppError> {
        let product = catalog.update_price(id, price_cents).await?;

        cache
            .dispatcher
            .on_mutation(ResourceClass::ProductDetail, None)
            .await?;

        info!(product_id = id, price_cents, "Price updated");
        Ok(product)
    }

    #[instrument(skip(cache, catalog))]
    pub async fn set_stock(
        cache: &CacheLayer,
        catalog: &dyn Catalog,
        id: i64,
        quantity: i64,
    ) -> Result<InventoryLevel, AppError> {
        let level = catalog.set_stock(id, quantity).await?;

        cache
            .dispatcher
            .on_mutation(ResourceClass::InventoryCount, Some(&[id.to_string()]))
            .await?;

        Ok(level)
    }

    #[instrument(skip(cache, catalog, dto), fields(records = dto.counts.len()))]
    pub async fn recount_stock(
        cache: &CacheLayer,
        catalog: &dyn Catalog,
        dto: StockRecountDto,
    ) -> Result<u64, AppError> {
        let written = catalog.recount_stock(&dto.counts).await?;

        cache
            .dispatcher
            .on_mutation(ResourceClass::InventoryCount, None)
            .await?;

        info!(written, "Stock recount applied");
        Ok(written)
    }
}

//! Source of truth for catalog data.
//!
//! The cache layer only ever reads through a [`Catalog`]; writes go to the
//! catalog first and invalidate the cache once they have committed.

use async_trait::async_trait;
use storefront_models::{
    CategoryFacets, InventoryLevel, Product, SearchPage, SearchQuery, StockCount,
};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryCatalog;
pub use postgres::PgCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product {0} not found")]
    ProductNotFound(i64),
    #[error("Category '{0}' not found")]
    CategoryNotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Catalog: Send + Sync + std::fmt::Debug {
    async fn product(&self, id: i64) -> Result<Product, CatalogError>;

    /// Stock on hand. Products without an inventory record have zero.
    async fn inventory(&self, product_id: i64) -> Result<InventoryLevel, CatalogError>;

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, CatalogError>;

    async fn category_facets(&self, slug: &str) -> Result<CategoryFacets, CatalogError>;

    async fn update_price(&self, id: i64, price_cents: i64) -> Result<Product, CatalogError>;

    async fn set_stock(&self, product_id: i64, quantity: i64)
    -> Result<InventoryLevel, CatalogError>;

    /// Applies all counts atomically. Returns the number of records written.
    async fn recount_stock(&self, counts: &[StockCount]) -> Result<u64, CatalogError>;
}

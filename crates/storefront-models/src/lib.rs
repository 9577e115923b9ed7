//! # Storefront Models
//!
//! Catalog domain models and DTOs for the Storefront API.
//!
//! Every model that is served from the cache round-trips through JSON, so
//! all of them derive both `Serialize` and `Deserialize`.
//!
//! # Modules
//!
//! - [`products`]: products, inventory levels and their write DTOs
//! - [`search`]: search filters and result pages
//! - [`facets`]: per-category aggregates
//!
//! # Example
//!
//! ```ignore
//! use storefront_models::search::{SearchQuery, SearchSort};
//!
//! let query = SearchQuery {
//!     category: Some("shoes".into()),
//!     sort: Some(SearchSort::PriceAsc),
//!     ..Default::default()
//! };
//! assert_eq!(query.page(), 1);
//! ```

pub mod facets;
pub mod products;
pub mod search;

// Re-export commonly used types at crate root for convenience
pub use facets::{CategoryFacets, PriceBucket};
pub use products::{
    InventoryLevel, Product, StockCount, StockRecountDto, UpdatePriceDto, UpdateStockDto,
};
pub use search::{SearchPage, SearchQuery, SearchSort};

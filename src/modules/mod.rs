pub mod cache_admin;
pub mod facets;
pub mod products;
pub mod search;
pub mod webhooks;

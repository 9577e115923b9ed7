//! # Storefront Cache
//!
//! Cache-aside layer for the Storefront API.
//!
//! This crate provides:
//! - Deterministic cache keys with versioned namespaces
//! - Per-class TTL policy and invalidation cascade rules
//! - A fail-open cache store over Redis, an in-memory cache, or nothing
//! - Read-through with request coalescing
//! - Invalidation after writes (exact deletes and version bumps)
//! - HTTP response annotation (`X-Cache`, `Cache-Control`)
//!
//! # Example
//!
//! ```ignore
//! use storefront_cache::{CacheConfig, CacheLayer, KeyParams, ResourceClass};
//!
//! let cache = CacheLayer::connect(&CacheConfig::from_env()).await?;
//!
//! let product = cache
//!     .reader
//!     .read_class(ResourceClass::ProductDetail, &KeyParams::id(42), || catalog.product(42))
//!     .await?;
//!
//! // After the write has committed:
//! cache.dispatcher.on_mutation(ResourceClass::ProductDetail, Some(&["42".into()])).await?;
//! ```

pub mod backend;
pub mod class;
pub mod config;
pub mod invalidation;
pub mod keys;
pub mod layer;
pub mod memory;
pub mod middleware;
pub mod reader;
pub mod redis;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod versions;

pub use backend::{CacheBackend, CacheError, NullBackend};
pub use class::{ResourceClass, TtlPolicy, UnknownResourceClass};
pub use config::{BackendKind, CacheConfig};
pub use invalidation::{InvalidationDispatcher, InvalidationReport};
pub use keys::{CacheKey, KeyBuilder, KeyError, KeyParams, ParamValue};
pub use layer::CacheLayer;
pub use middleware::{CacheControlConfig, Cached, cache_control};
pub use reader::{CacheAsideReader, CacheStats};
pub use store::{CacheStatus, CacheStore, Lookup};
pub use versions::ResourceVersionTable;

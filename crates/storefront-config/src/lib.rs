//! # Storefront Config
//!
//! Configuration types for the Storefront API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`server`]: listen address
//! - [`secrets`]: shared secrets for the invalidation webhook and cache administration
//!
//! Cache settings live with the cache itself, in `storefront_cache::CacheConfig`.
//!
//! # Example
//!
//! ```ignore
//! use storefront_config::{CorsConfig, SecretsConfig, ServerConfig};
//!
//! let server = ServerConfig::from_env();
//! let cors = CorsConfig::from_env();
//! let secrets = SecretsConfig::from_env();
//! ```

pub mod cors;
pub mod secrets;
pub mod server;

pub use cors::CorsConfig;
pub use secrets::SecretsConfig;
pub use server::ServerConfig;

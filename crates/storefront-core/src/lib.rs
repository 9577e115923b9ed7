//! # Storefront Core
//!
//! Shared primitives for the Storefront API.
//!
//! - [`auth`]: shared-secret bearer verification for webhook and admin callers
//!
//! # Example
//!
//! ```ignore
//! use storefront_core::auth::verify_bearer;
//!
//! let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
//! verify_bearer(header, config.webhook_secret.as_deref())?;
//! ```

pub mod auth;

pub use auth::{AuthError, verify_bearer};

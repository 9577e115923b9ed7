//! Extractors guarding privileged endpoints.
//!
//! - [`auth`]: shared-secret bearer checks for the invalidation webhook and
//!   cache administration
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::WebhookCaller;
//!
//! async fn invalidate(_caller: WebhookCaller, State(state): State<AppState>) {
//!     // Only executes if the bearer secret matched
//! }
//! ```

pub mod auth;

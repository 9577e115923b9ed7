//! HTTP response annotation for cached reads.
//!
//! Responses built from a [`Lookup`] carry:
//! - `X-Cache: HIT` or `X-Cache: MISS`
//! - `Cache-Control` whose `max-age` is the entry's remaining server-side
//!   TTL, so browsers and CDNs never keep a response fresh for longer than
//!   the internal cache does
//!
//! # Example
//!
//! ```ignore
//! use storefront_cache::middleware::Cached;
//!
//! async fn get_product(...) -> Result<Cached<Product>, AppError> {
//!     let lookup = state.cache.reader.read_class(class, &params, || ...).await?;
//!     Ok(Cached::new(class, lookup))
//! }
//! ```

use crate::ResourceClass;
use crate::store::Lookup;
use axum::{
    Json,
    http::{
        HeaderName, HeaderValue,
        header::CACHE_CONTROL,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::time::Duration;
use tower_http::set_header::SetResponseHeaderLayer;

/// Response header reporting whether the body came from the cache.
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Configuration for Cache-Control header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheControlConfig {
    /// Whether the response can be cached by any cache (public) or only by browser (private).
    pub public: bool,
    /// Maximum age in seconds the response is considered fresh.
    pub max_age: u64,
    /// Whether the response should not be cached at all.
    pub no_cache: bool,
    /// Whether the response should not be stored at all.
    pub no_store: bool,
}

impl CacheControlConfig {
    pub fn public(max_age: u64) -> Self {
        Self {
            public: true,
            max_age,
            no_cache: false,
            no_store: false,
        }
    }

    pub fn private(max_age: u64) -> Self {
        Self {
            public: false,
            ..Self::public(max_age)
        }
    }

    /// Create a no-store configuration (never cache).
    pub fn no_store() -> Self {
        Self {
            public: false,
            max_age: 0,
            no_cache: true,
            no_store: true,
        }
    }

    /// Freshness directive for a value of `class` with `remaining` TTL.
    ///
    /// Sub-second remainders round down, so clients never outlive the
    /// server-side entry.
    pub fn for_class(class: ResourceClass, remaining: Duration) -> Self {
        let max_age = remaining.as_secs();
        if class.is_private() {
            Self::private(max_age)
        } else {
            Self::public(max_age)
        }
    }

    /// Build the Cache-Control header value.
    pub fn to_header_value(&self) -> HeaderValue {
        let mut directives = Vec::new();

        if self.no_store {
            directives.push("no-store".to_string());
        }

        if self.no_cache {
            directives.push("no-cache".to_string());
        }

        if !self.no_store && !self.no_cache {
            if self.public {
                directives.push("public".to_string());
            } else {
                directives.push("private".to_string());
            }

            directives.push(format!("max-age={}", self.max_age));
        }

        HeaderValue::from_str(&directives.join(", "))
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
    }
}

impl Default for CacheControlConfig {
    fn default() -> Self {
        Self::no_store()
    }
}

/// Helper struct to generate Cache-Control header values.
#[derive(Clone)]
pub struct CacheControlMakeHeader(HeaderValue);

impl<B> tower_http::set_header::MakeHeaderValue<Response<B>> for CacheControlMakeHeader {
    fn make_header_value(&mut self, _message: &Response<B>) -> Option<HeaderValue> {
        Some(self.0.clone())
    }
}

/// Layer setting a fixed Cache-Control on responses that do not carry one.
///
/// ```ignore
/// let admin = Router::new()
///     .route("/cache/clear", post(clear_cache))
///     .layer(cache_control(CacheControlConfig::no_store()));
/// ```
pub fn cache_control(config: CacheControlConfig) -> SetResponseHeaderLayer<CacheControlMakeHeader> {
    let header_value = config.to_header_value();
    SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, CacheControlMakeHeader(header_value))
}

/// JSON response annotated with the outcome of a cached read.
#[derive(Debug)]
pub struct Cached<T> {
    class: ResourceClass,
    lookup: Lookup<T>,
}

impl<T> Cached<T> {
    pub fn new(class: ResourceClass, lookup: Lookup<T>) -> Self {
        Self { class, lookup }
    }
}

impl<T: Serialize> IntoResponse for Cached<T> {
    fn into_response(self) -> Response {
        let cache_control =
            CacheControlConfig::for_class(self.class, self.lookup.remaining).to_header_value();
        let status = HeaderValue::from_static(self.lookup.status.as_str());

        let mut response = Json(self.lookup.value).into_response();
        let headers = response.headers_mut();
        headers.insert(X_CACHE.clone(), status);
        headers.insert(CACHE_CONTROL, cache_control);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_cache_control_public() {
        let config = CacheControlConfig::public(300);
        let header = config.to_header_value();
        assert_eq!(header.to_str().unwrap(), "public, max-age=300");
    }

    #[test]
    fn test_cache_control_private() {
        let config = CacheControlConfig::private(60);
        let header = config.to_header_value();
        assert_eq!(header.to_str().unwrap(), "private, max-age=60");
    }

    #[test]
    fn test_cache_control_no_store() {
        let header = CacheControlConfig::no_store().to_header_value();
        assert_eq!(header.to_str().unwrap(), "no-store, no-cache");
    }

    #[test]
    fn test_for_class_rounds_down_and_respects_privacy() {
        let product = CacheControlConfig::for_class(
            ResourceClass::ProductDetail,
            Duration::from_millis(59_900),
        );
        assert_eq!(product, CacheControlConfig::public(59));

        let cart = CacheControlConfig::for_class(ResourceClass::CartSnapshot, Duration::from_secs(30));
        assert_eq!(cart, CacheControlConfig::private(30));
    }

    #[tokio::test]
    async fn test_cached_response_headers() {
        let response = Cached::new(
            ResourceClass::SearchResults,
            Lookup::hit(vec!["a", "b"], Duration::from_secs(12)),
        )
        .into_response();

        assert_eq!(response.headers().get("x-cache").unwrap(), "HIT");
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=12"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"["a","b"]"#);
    }

    #[test]
    fn test_miss_uses_full_ttl() {
        let response = Cached::new(
            ResourceClass::InventoryCount,
            Lookup::miss(3, ResourceClass::InventoryCount.default_ttl()),
        )
        .into_response();

        assert_eq!(response.headers().get("x-cache").unwrap(), "MISS");
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=10"
        );
    }
}

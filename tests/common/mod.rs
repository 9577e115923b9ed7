use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use storefront::catalog::InMemoryCatalog;
use storefront::router::init_router;
use storefront::state::AppState;
use storefront_cache::CacheLayer;
use storefront_config::SecretsConfig;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const ADMIN_TOKEN: &str = "test-admin-token";

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<InMemoryCatalog>,
    pub state: AppState,
}

pub fn secrets() -> SecretsConfig {
    SecretsConfig {
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        admin_token: Some(ADMIN_TOKEN.to_string()),
    }
}

/// App over the seeded in-memory catalog and an in-memory cache.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(CacheLayer::in_memory(), InMemoryCatalog::seeded())
}

pub fn setup_test_app_with(cache: CacheLayer, catalog: InMemoryCatalog) -> TestApp {
    let catalog = Arc::new(catalog);
    let state = AppState::new(cache, catalog.clone(), secrets());
    TestApp {
        router: init_router(state.clone()),
        catalog,
        state,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn x_cache(&self) -> &str {
        self.header("x-cache")
    }

    pub fn cache_control(&self) -> &str {
        self.header("cache-control")
    }

    fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// `max-age` directive of the Cache-Control header.
    pub fn max_age(&self) -> Option<u64> {
        self.cache_control()
            .split(',')
            .map(str::trim)
            .find_map(|d| d.strip_prefix("max-age="))
            .and_then(|v| v.parse().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

#[allow(dead_code)]
pub async fn get_with_bearer(router: &Router, uri: &str, token: &str) -> TestResponse {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

#[allow(dead_code)]
pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> TestResponse {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();
    send(router, request).await
}

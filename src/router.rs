use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::cache_admin::init_cache_admin_router;
use crate::modules::facets::init_facets_router;
use crate::modules::products::init_products_router;
use crate::modules::search::init_search_router;
use crate::modules::webhooks::init_webhooks_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use storefront_cache::{CacheControlConfig, cache_control};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .nest("/products", init_products_router())
                .nest("/search", init_search_router())
                .nest("/categories", init_facets_router())
                .nest("/webhooks", init_webhooks_router())
                .nest("/admin/cache", init_cache_admin_router())
                // Cached reads set their own Cache-Control; everything else,
                // errors included, must not be stored downstream.
                .layer(cache_control(CacheControlConfig::no_store())),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .expose_headers([axum::http::HeaderName::from_static("x-cache")])
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

mod common;

use common::{ADMIN_TOKEN, get, send_json, setup_test_app_with};
use serde_json::json;
use std::sync::Arc;
use storefront::catalog::InMemoryCatalog;
use storefront_cache::testing::{SwitchableBackend, UnreachableBackend};
use storefront_cache::{CacheConfig, CacheLayer};

fn unreachable_cache() -> CacheLayer {
    CacheLayer::with_backend(Arc::new(UnreachableBackend), &CacheConfig::in_memory()).unwrap()
}

#[tokio::test]
async fn test_unreachable_store_serves_from_catalog() {
    let app = setup_test_app_with(unreachable_cache(), InMemoryCatalog::seeded());

    for _ in 0..3 {
        let response = get(&app.router, "/api/products/5").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.x_cache(), "MISS");
        assert_eq!(response.body["sku"], "BG-002");
    }
    assert_eq!(app.catalog.read_count(), 3);
}

#[tokio::test]
async fn test_writes_succeed_while_store_is_down() {
    let app = setup_test_app_with(unreachable_cache(), InMemoryCatalog::seeded());

    let update = send_json(
        &app.router,
        "PUT",
        "/api/products/5/price",
        None,
        json!({ "price_cents": 9_999 }),
    )
    .await;
    assert_eq!(update.status, 200);

    let detail = get(&app.router, "/api/products/5").await;
    assert_eq!(detail.body["price_cents"], 9_999);
}

#[tokio::test]
async fn test_purge_reports_unavailable_store() {
    let app = setup_test_app_with(unreachable_cache(), InMemoryCatalog::seeded());

    let response = send_json(
        &app.router,
        "POST",
        "/api/admin/cache/clear",
        Some(ADMIN_TOKEN),
        json!({ "mode": "purge" }),
    )
    .await;
    assert_eq!(response.status, 503);
}

#[tokio::test]
async fn test_no_stale_read_after_outage_during_write() {
    let backend = Arc::new(SwitchableBackend::default());
    let cache = CacheLayer::with_backend(backend.clone(), &CacheConfig::in_memory()).unwrap();
    let app = setup_test_app_with(cache, InMemoryCatalog::seeded());

    get(&app.router, "/api/search?category=bags").await;
    assert_eq!(get(&app.router, "/api/search?category=bags").await.x_cache(), "HIT");

    backend.set_offline(true);
    let update = send_json(
        &app.router,
        "PUT",
        "/api/products/4/price",
        None,
        json!({ "price_cents": 1_000 }),
    )
    .await;
    assert_eq!(update.status, 200);
    backend.set_offline(false);

    let listing = get(&app.router, "/api/search?category=bags").await;
    assert_eq!(listing.x_cache(), "MISS");
    assert_eq!(listing.body["items"][0]["price_cents"], 1_000);
}

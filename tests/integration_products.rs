mod common;

use common::{get, send_json, setup_test_app, setup_test_app_with};
use serde_json::json;
use std::time::Duration;
use storefront::catalog::InMemoryCatalog;
use storefront_cache::CacheLayer;

#[tokio::test]
async fn test_product_miss_then_hit() {
    let app = setup_test_app();

    let first = get(&app.router, "/api/products/1").await;
    assert_eq!(first.status, 200);
    assert_eq!(first.x_cache(), "MISS");
    assert_eq!(first.body["sku"], "SH-001");
    assert!(first.cache_control().starts_with("public"));
    let max_age = first.max_age().unwrap();
    assert!(max_age > 0 && max_age <= 90, "max-age {max_age} exceeds TTL");

    let second = get(&app.router, "/api/products/1").await;
    assert_eq!(second.status, 200);
    assert_eq!(second.x_cache(), "HIT");
    assert_eq!(second.body, first.body);
    assert!(second.max_age().unwrap() <= max_age);

    assert_eq!(app.catalog.read_count(), 1);
}

#[tokio::test]
async fn test_unknown_product_is_not_cached() {
    let app = setup_test_app();

    let response = get(&app.router, "/api/products/999").await;
    assert_eq!(response.status, 404);
    assert!(response.cache_control().contains("no-store"));
    assert!(response.headers.get("x-cache").is_none());

    let again = get(&app.router, "/api/products/999").await;
    assert_eq!(again.status, 404);
    assert_eq!(app.catalog.read_count(), 2);
}

#[tokio::test]
async fn test_price_update_invalidates_detail_and_listings() {
    let app = setup_test_app();

    get(&app.router, "/api/products/1").await;
    let listing = get(&app.router, "/api/search?category=shoes").await;
    assert_eq!(listing.x_cache(), "MISS");
    assert_eq!(get(&app.router, "/api/search?category=shoes").await.x_cache(), "HIT");

    let update = send_json(
        &app.router,
        "PUT",
        "/api/products/1/price",
        None,
        json!({ "price_cents": 7_999 }),
    )
    .await;
    assert_eq!(update.status, 200);
    assert_eq!(update.body["price_cents"], 7_999);
    assert!(update.cache_control().contains("no-store"));

    let detail = get(&app.router, "/api/products/1").await;
    assert_eq!(detail.x_cache(), "MISS");
    assert_eq!(detail.body["price_cents"], 7_999);

    let listing = get(&app.router, "/api/search?category=shoes").await;
    assert_eq!(listing.x_cache(), "MISS");
    let prices: Vec<i64> = listing.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price_cents"].as_i64().unwrap())
        .collect();
    assert!(prices.contains(&7_999));
}

#[tokio::test]
async fn test_invalid_price_is_rejected() {
    let app = setup_test_app();

    let response = send_json(
        &app.router,
        "PUT",
        "/api/products/1/price",
        None,
        json!({ "price_cents": -5 }),
    )
    .await;
    assert_eq!(response.status, 422);

    let missing = send_json(&app.router, "PUT", "/api/products/1/price", None, json!({})).await;
    assert_eq!(missing.status, 400);
}

#[tokio::test]
async fn test_stock_update_refreshes_inventory() {
    let app = setup_test_app();

    let first = get(&app.router, "/api/products/3/inventory").await;
    assert_eq!(first.x_cache(), "MISS");
    assert_eq!(first.body["quantity"], 40);
    let max_age = first.max_age().unwrap();
    assert!(max_age <= 10);

    assert_eq!(get(&app.router, "/api/products/3/inventory").await.x_cache(), "HIT");

    let update = send_json(
        &app.router,
        "PUT",
        "/api/products/3/stock",
        None,
        json!({ "quantity": 5 }),
    )
    .await;
    assert_eq!(update.status, 200);

    let after = get(&app.router, "/api/products/3/inventory").await;
    assert_eq!(after.x_cache(), "MISS");
    assert_eq!(after.body["quantity"], 5);
}

#[tokio::test]
async fn test_stock_recount_drops_in_stock_listings() {
    let app = setup_test_app();

    let before = get(&app.router, "/api/search?category=bags&in_stock=true").await;
    assert_eq!(before.body["total"], 2);

    let recount = send_json(
        &app.router,
        "POST",
        "/api/products/stock/recount",
        None,
        json!({ "counts": [
            { "product_id": 4, "quantity": 0 },
            { "product_id": 5, "quantity": 0 }
        ] }),
    )
    .await;
    assert_eq!(recount.status, 200);
    assert_eq!(recount.body["written"], 2);

    let after = get(&app.router, "/api/search?category=bags&in_stock=true").await;
    assert_eq!(after.x_cache(), "MISS");
    assert_eq!(after.body["total"], 0);
}

#[tokio::test]
async fn test_concurrent_misses_query_catalog_once() {
    let app = setup_test_app_with(
        CacheLayer::in_memory(),
        InMemoryCatalog::seeded().with_latency(Duration::from_millis(100)),
    );

    let requests = (0..10).map(|_| get(&app.router, "/api/products/2"));
    let responses = futures::future::join_all(requests).await;

    for response in &responses {
        assert_eq!(response.status, 200);
        assert_eq!(response.body["sku"], "SH-002");
    }
    assert_eq!(app.catalog.read_count(), 1);

    let stats = app.state.cache.reader.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits + stats.misses + stats.coalesced, 10);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test]
async fn test_stock_update_refreshes_category_facets() {
    let app = setup_test_app();

    let before = get(&app.router, "/api/categories/shoes/facets").await;
    assert_eq!(before.body["in_stock_count"], 2);
    assert_eq!(get(&app.router, "/api/categories/shoes/facets").await.x_cache(), "HIT");

    let update = send_json(
        &app.router,
        "PUT",
        "/api/products/2/stock",
        None,
        json!({ "quantity": 5 }),
    )
    .await;
    assert_eq!(update.status, 200);

    let after = get(&app.router, "/api/categories/shoes/facets").await;
    assert_eq!(after.x_cache(), "MISS");
    assert_eq!(after.body["in_stock_count"], 3);
}

mod common;

use common::{
    ADMIN_TOKEN, WEBHOOK_SECRET, get, get_with_bearer, send_json, setup_test_app,
};
use serde_json::json;

#[tokio::test]
async fn test_webhook_requires_secret() {
    let app = setup_test_app();
    let body = json!({ "type": "product_detail", "id": 1 });

    let missing = send_json(&app.router, "POST", "/api/webhooks/invalidate", None, body.clone()).await;
    assert_eq!(missing.status, 401);

    let wrong = send_json(
        &app.router,
        "POST",
        "/api/webhooks/invalidate",
        Some("not-the-secret"),
        body.clone(),
    )
    .await;
    assert_eq!(wrong.status, 401);

    // The admin token is not a webhook credential.
    let admin = send_json(
        &app.router,
        "POST",
        "/api/webhooks/invalidate",
        Some(ADMIN_TOKEN),
        body,
    )
    .await;
    assert_eq!(admin.status, 401);
}

#[tokio::test]
async fn test_webhook_entity_invalidation() {
    let app = setup_test_app();

    get(&app.router, "/api/products/4").await;
    assert_eq!(get(&app.router, "/api/products/4").await.x_cache(), "HIT");

    let response = send_json(
        &app.router,
        "POST",
        "/api/webhooks/invalidate",
        Some(WEBHOOK_SECRET),
        json!({ "type": "product_detail", "id": 4 }),
    )
    .await;
    assert_eq!(response.status, 200);
    assert!(response.cache_control().contains("no-store"));
    let deleted = response.body["deleted_keys"].as_array().unwrap();
    assert!(deleted.iter().any(|k| k.as_str().unwrap().ends_with(":4")));

    assert_eq!(get(&app.router, "/api/products/4").await.x_cache(), "MISS");
}

#[tokio::test]
async fn test_webhook_class_invalidation_bumps_version() {
    let app = setup_test_app();

    get(&app.router, "/api/categories/bags/facets").await;
    assert_eq!(get(&app.router, "/api/categories/bags/facets").await.x_cache(), "HIT");

    let response = send_json(
        &app.router,
        "POST",
        "/api/webhooks/invalidate",
        Some(WEBHOOK_SECRET),
        json!({ "type": "category_facets" }),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["bumped"][0]["class"], "category_facets");

    assert_eq!(get(&app.router, "/api/categories/bags/facets").await.x_cache(), "MISS");
}

#[tokio::test]
async fn test_webhook_rejects_unknown_type() {
    let app = setup_test_app();

    let response = send_json(
        &app.router,
        "POST",
        "/api/webhooks/invalidate",
        Some(WEBHOOK_SECRET),
        json!({ "type": "widgets", "id": 1 }),
    )
    .await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_admin_stats_reports_counters() {
    let app = setup_test_app();

    get(&app.router, "/api/products/1").await;
    get(&app.router, "/api/products/1").await;

    let unauthorized = get(&app.router, "/api/admin/cache/stats").await;
    assert_eq!(unauthorized.status, 401);

    let stats = get_with_bearer(&app.router, "/api/admin/cache/stats", ADMIN_TOKEN).await;
    assert_eq!(stats.status, 200);
    assert_eq!(stats.body["backend"], "memory");
    assert_eq!(stats.body["enabled"], true);
    assert_eq!(stats.body["namespace"], "storefront-v1");
    assert_eq!(stats.body["hits"], 1);
    assert_eq!(stats.body["misses"], 1);
    assert!(stats.body["versions"]["product_detail"].is_i64());
}

#[tokio::test]
async fn test_admin_clear_by_version() {
    let app = setup_test_app();

    let before = get_with_bearer(&app.router, "/api/admin/cache/stats", ADMIN_TOKEN).await;
    let version = before.body["versions"]["search_results"].as_i64().unwrap();

    get(&app.router, "/api/search?q=pack").await;
    assert_eq!(get(&app.router, "/api/search?q=pack").await.x_cache(), "HIT");

    let cleared = send_json(
        &app.router,
        "POST",
        "/api/admin/cache/clear",
        Some(ADMIN_TOKEN),
        json!({ "class": "search_results" }),
    )
    .await;
    assert_eq!(cleared.status, 200);

    assert_eq!(get(&app.router, "/api/search?q=pack").await.x_cache(), "MISS");

    let after = get_with_bearer(&app.router, "/api/admin/cache/stats", ADMIN_TOKEN).await;
    assert!(after.body["versions"]["search_results"].as_i64().unwrap() > version);
}

#[tokio::test]
async fn test_admin_purge_everything() {
    let app = setup_test_app();

    get(&app.router, "/api/products/1").await;
    get(&app.router, "/api/products/2/inventory").await;

    let purged = send_json(
        &app.router,
        "POST",
        "/api/admin/cache/clear",
        Some(ADMIN_TOKEN),
        json!({ "mode": "purge" }),
    )
    .await;
    assert_eq!(purged.status, 200);
    assert!(purged.body["purged"].as_u64().unwrap() >= 2);

    assert_eq!(get(&app.router, "/api/products/1").await.x_cache(), "MISS");
    assert_eq!(get(&app.router, "/api/products/2/inventory").await.x_cache(), "MISS");
}

#[tokio::test]
async fn test_admin_rejects_webhook_secret_and_unknown_class() {
    let app = setup_test_app();

    let wrong_secret = send_json(
        &app.router,
        "POST",
        "/api/admin/cache/clear",
        Some(WEBHOOK_SECRET),
        json!({}),
    )
    .await;
    assert_eq!(wrong_secret.status, 401);

    let unknown = send_json(
        &app.router,
        "POST",
        "/api/admin/cache/clear",
        Some(ADMIN_TOKEN),
        json!({ "class": "widgets" }),
    )
    .await;
    assert_eq!(unknown.status, 400);
}

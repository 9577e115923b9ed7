use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use storefront_cache::{Cached, ResourceClass};
use storefront_models::{InventoryLevel, Product, StockRecountDto, UpdatePriceDto, UpdateStockDto};
use tracing::instrument;
use utoipa::ToSchema;

use crate::modules::products::service::ProductService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

#[derive(Debug, Serialize, ToSchema)]
pub struct RecountResponse {
    pub written: u64,
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product details", body = Product,
            headers(("X-Cache" = String, description = "HIT or MISS"))),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Cached<Product>, AppError> {
    let lookup = ProductService::get_product(&state.cache, state.catalog.as_ref(), id).await?;
    Ok(Cached::new(ResourceClass::ProductDetail, lookup))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/inventory",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Stock on hand", body = InventoryLevel,
            headers(("X-Cache" = String, description = "HIT or MISS"))),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Cached<InventoryLevel>, AppError> {
    let lookup = ProductService::get_inventory(&state.cache, state.catalog.as_ref(), id).await?;
    Ok(Cached::new(ResourceClass::InventoryCount, lookup))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/price",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = UpdatePriceDto,
    responses(
        (status = 200, description = "Price updated", body = Product),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid price")
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn update_price(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdatePriceDto>,
) -> Result<Json<Product>, AppError> {
    let product =
        ProductService::update_price(&state.cache, state.catalog.as_ref(), id, dto.price_cents)
            .await?;
    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/stock",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = UpdateStockDto,
    responses(
        (status = 200, description = "Stock updated", body = InventoryLevel),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid quantity")
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdateStockDto>,
) -> Result<Json<InventoryLevel>, AppError> {
    let level =
        ProductService::set_stock(&state.cache, state.catalog.as_ref(), id, dto.quantity).await?;
    Ok(Json(level))
}

#[utoipa::path(
    post,
    path = "/api/products/stock/recount",
    request_body = StockRecountDto,
    responses(
        (status = 200, description = "Recount applied", body = RecountResponse),
        (status = 404, description = "Unknown product in recount"),
        (status = 422, description = "Invalid counts")
    ),
    tag = "Products"
)]
#[instrument(skip(state, dto))]
pub async fn recount_stock(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<StockRecountDto>,
) -> Result<Json<RecountResponse>, AppError> {
    let written = ProductService::recount_stock(&state.cache, state.catalog.as_ref(), dto).await?;
    Ok(Json(RecountResponse { written }))
}

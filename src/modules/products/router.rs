use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{get_inventory, get_product, recount_stock, update_price, update_stock};

pub fn init_products_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_product))
        .route("/{id}/inventory", get(get_inventory))
        .route("/{id}/price", put(update_price))
        .route("/{id}/stock", put(update_stock))
        .route("/stock/recount", post(recount_stock))
}

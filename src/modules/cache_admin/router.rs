use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{cache_stats, clear_cache};

pub fn init_cache_admin_router() -> Router<AppState> {
    Router::new()
        .route("/clear", post(clear_cache))
        .route("/stats", get(cache_stats))
}

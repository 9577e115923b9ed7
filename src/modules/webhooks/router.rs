use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::invalidate;

pub fn init_webhooks_router() -> Router<AppState> {
    Router::new().route("/invalidate", post(invalidate))
}

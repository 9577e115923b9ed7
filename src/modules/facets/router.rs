use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::get_category_facets;

pub fn init_facets_router() -> Router<AppState> {
    Router::new().route("/{slug}/facets", get(get_category_facets))
}

//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Create the router with all indexing routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/startIndexing", get(handlers::start_indexing))
        .route("/api/stopIndexing", get(handlers::stop_indexing))
        .route("/api/indexPage", post(handlers::index_page))
        .with_state(state)
}

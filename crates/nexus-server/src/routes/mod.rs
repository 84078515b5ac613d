//! HTTP route handlers.

pub mod chat;
pub mod classifier;
pub mod error;
pub mod stats;
pub mod tickets;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(tickets::routes())
        .merge(chat::routes())
        .merge(classifier::routes())
        .merge(stats::routes())
}

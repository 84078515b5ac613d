//! Dashboard metrics and service status routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::error::ApiResult;
use crate::state::AppState;
use nexus_service::DashboardMetrics;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/status", get(get_status))
}

/// GET /api/metrics: headline counts and breakdowns.
async fn get_metrics(State(state): State<Arc<AppState>>) -> ApiResult<DashboardMetrics> {
    Ok(Json(state.service.metrics()?))
}

/// GET /api/status: which classifier will handle the next complaint.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let credential = state.classifier_config.read().resolve_credential();
    let store_path = state.service.store().path().display().to_string();

    Json(serde_json::json!({
        "remoteClassifier": credential.is_some(),
        "provider": credential.as_ref().map(|c| c.provider.to_string()),
        "model": credential.as_ref().map(|c| c.model.clone()),
        "ticketFile": store_path,
        "port": state.config.port,
        "chatSessions": state.sessions.session_count(),
        "incidents": state.service.active_incidents_context(),
    }))
}

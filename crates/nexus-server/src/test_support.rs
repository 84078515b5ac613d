//! Router test helpers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::state::AppState;
use nexus_classify::ClassifierConfig;
use nexus_core::NexusConfig;

/// State over a fresh data directory, with no provider keys so every
/// complaint goes through the keyword fallback.
pub fn test_state() -> (Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = NexusConfig::from_env(dir.path()).unwrap();
    let config_path = config.data_paths.classifier_config_file.clone();
    let state = AppState::new(config).unwrap();
    *state.classifier_config.write() = ClassifierConfig {
        config_path,
        ..Default::default()
    };
    (Arc::new(state), dir)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

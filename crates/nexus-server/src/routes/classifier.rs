//! Classifier configuration routes: provider keys and models.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use super::error::ApiResult;
use crate::state::AppState;
use nexus_classify::config::{ClassifierConfigResponse, ClassifierConfigUpdate};
use nexus_classify::providers;
use nexus_classify::LLMProvider;
use nexus_core::Error;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/classifier/config",
            get(get_config).put(update_config),
        )
        .route("/classifier/config/test", post(test_key))
}

#[derive(Debug, Deserialize)]
struct TestKeyRequest {
    provider: String,
    #[serde(rename = "apiKey")]
    api_key: String,
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<ClassifierConfigResponse> {
    Json(state.classifier_config.read().to_response())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ClassifierConfigUpdate>,
) -> ApiResult<ClassifierConfigResponse> {
    if let Some(p) = update.preferred_provider.as_deref() {
        if p != "auto" {
            p.parse::<LLMProvider>().map_err(Error::Validation)?;
        }
    }

    let mut config = state.classifier_config.write();
    config.apply_update(&update);
    config.save().map_err(Error::from)?;
    info!(
        "Classifier config updated (active provider: {:?})",
        config.resolve_credential().map(|c| c.provider)
    );
    Ok(Json(config.to_response()))
}

async fn test_key(
    State(_state): State<Arc<AppState>>,
    Json(req): Json<TestKeyRequest>,
) -> ApiResult<serde_json::Value> {
    let provider: LLMProvider = req.provider.parse().map_err(Error::Validation)?;
    let result = providers::test_api_key(provider, &req.api_key).await;
    Ok(Json(match result {
        Ok(()) => serde_json::json!({ "success": true }),
        Err(e) => serde_json::json!({ "success": false, "error": e }),
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::build_router;
    use crate::test_support::{send, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_masks_and_persists() {
        let (state, dir) = test_state();
        let app = build_router(state.clone());

        let (status, body) = send(
            &app,
            "PUT",
            "/api/classifier/config",
            Some(json!({ "preferredProvider": "groq", "groqApiKey": "gsk-secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["groqConfigured"], true);
        assert_eq!(body["activeProvider"], "groq");
        assert!(!body.to_string().contains("gsk-secret"));

        let saved =
            std::fs::read_to_string(dir.path().join("classifier-config.json")).unwrap();
        assert!(saved.contains("gsk-secret"));

        let (_, fetched) = send(&app, "GET", "/api/classifier/config", None).await;
        assert_eq!(fetched["preferredProvider"], "groq");
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, _) = send(
            &app,
            "PUT",
            "/api/classifier/config",
            Some(json!({ "preferredProvider": "skynet" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

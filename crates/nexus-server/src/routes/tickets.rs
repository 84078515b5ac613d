//! Ticket routes: create, list, track, and operator actions.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use crate::state::AppState;
use nexus_classify::{Credential, ImageAttachment, LLMProvider};
use nexus_core::Error;
use nexus_service::{CreatedTicket, NewTicket, DEFAULT_CHANNEL};
use nexus_store::{Ticket, TicketStatus};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/tickets",
            get(list_tickets).post(create_ticket).delete(reset_tickets),
        )
        .route("/tickets/search", get(search_tickets))
        .route("/tickets/queue", get(open_queue))
        .route("/tickets/{id}/claim", post(claim_ticket))
        .route("/tickets/{id}/resolve", post(resolve_ticket))
        .route("/tickets/{id}/transfer", post(transfer_ticket))
}

// ---------------------------------------------------------------
// Request types
// ---------------------------------------------------------------

/// Base64 image sent with a complaint.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagePayload {
    #[serde(rename = "mimeType", default = "default_mime")]
    pub mime_type: String,
    pub data: String,
}

fn default_mime() -> String {
    "image/png".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    pub message: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub image: Option<ImagePayload>,
    /// Per-request key, as typed into the sidebar of the chat page.
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
struct TransferRequest {
    department: String,
}

// ---------------------------------------------------------------
// Creation
// ---------------------------------------------------------------

/// Classify and persist a complaint. Shared with the chat route.
pub(crate) async fn submit(
    state: &AppState,
    req: CreateTicketRequest,
) -> Result<CreatedTicket, ApiError> {
    let credential = resolve_credential(state, &req)?;

    let image = match req.image {
        Some(payload) => Some(ImageAttachment {
            data: BASE64
                .decode(payload.data.trim())
                .map_err(|e| Error::Validation(format!("image is not valid base64: {}", e)))?,
            mime_type: payload.mime_type,
        }),
        None => None,
    };

    let new = NewTicket {
        raw_text: req.message,
        channel: req.channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
        contact: req.contact.unwrap_or_default(),
        image,
    };

    Ok(state.service.create_ticket(new, credential.as_ref()).await?)
}

/// Request key wins over the stored configuration.
fn resolve_credential(
    state: &AppState,
    req: &CreateTicketRequest,
) -> Result<Option<Credential>, ApiError> {
    let provider = match req.provider.as_deref() {
        Some(p) => Some(p.parse::<LLMProvider>().map_err(Error::Validation)?),
        None => None,
    };

    let config = state.classifier_config.read();
    Ok(match req.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Some(config.credential_with_key(provider, key)),
        _ => config.resolve_credential(),
    })
}

async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> ApiResult<CreatedTicket> {
    Ok(Json(submit(&state, req).await?))
}

// ---------------------------------------------------------------
// Queries
// ---------------------------------------------------------------

async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Ticket>> {
    let tickets = match query.status.as_deref() {
        None | Some("") | Some("All") => state.service.list_tickets()?,
        Some(raw) => {
            let status: TicketStatus = raw.parse().map_err(Error::Validation)?;
            state.service.list_by_status(status)?
        }
    };
    Ok(Json(tickets))
}

async fn search_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<Ticket>> {
    let found = state.service.find_by_id(&query.q)?;
    if found.is_empty() {
        return Err(Error::NotFound(query.q).into());
    }
    Ok(Json(found))
}

async fn open_queue(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Ticket>> {
    Ok(Json(state.service.open_queue()?))
}

// ---------------------------------------------------------------
// Actions
// ---------------------------------------------------------------

async fn claim_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Ticket> {
    Ok(Json(state.service.claim(&id)?))
}

async fn resolve_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Ticket> {
    Ok(Json(state.service.resolve(&id)?))
}

async fn transfer_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<Ticket> {
    Ok(Json(state.service.transfer(&id, &req.department)?))
}

async fn reset_tickets(State(state): State<Arc<AppState>>) -> ApiResult<serde_json::Value> {
    state.service.reset_store()?;
    state.sessions.clear();
    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::build_router;
    use crate::test_support::{send, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_list() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/tickets",
            Some(json!({
                "message": "My laptop won't turn on",
                "channel": "Web Portal",
                "contact": "a@x.com",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticket"]["department"], "Hardware");
        assert_eq!(body["ticket"]["urgency"], "High");
        assert_eq!(body["ticket"]["status"], "Open");
        assert_eq!(body["source"], "fallback");

        let (status, list) = send(&app, "GET", "/api/tickets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["ticket_id"], body["ticket"]["ticket_id"]);
    }

    #[tokio::test]
    async fn test_claim_flow_and_conflict() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (_, created) = send(
            &app,
            "POST",
            "/api/tickets",
            Some(json!({ "message": "wifi is slow on floor 2" })),
        )
        .await;
        let id = created["ticket"]["ticket_id"].as_str().unwrap().to_string();

        let (status, claimed) = send(&app, "POST", &format!("/api/tickets/{}/claim", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claimed["status"], "In Progress");

        let (status, err) = send(&app, "POST", &format!("/api/tickets/{}/claim", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(err["error"].is_string());

        let (status, transferred) = send(
            &app,
            "POST",
            &format!("/api/tickets/{}/transfer", id),
            Some(json!({ "department": "Software" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transferred["department"], "Software");
        assert_eq!(transferred["status"], "Open");

        let (status, resolved) =
            send(&app, "POST", &format!("/api/tickets/{}/resolve", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["status"], "Resolved");

        let (_, open) = send(&app, "GET", "/api/tickets?status=Open", None).await;
        assert!(open.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ticket_is_404() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, _) = send(&app, "POST", "/api/tickets/TKT-NOPE00/resolve", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/tickets/search?q=zzz", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_inputs_are_422() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, _) = send(&app, "GET", "/api/tickets?status=Closed", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "POST",
            "/api/tickets",
            Some(json!({ "message": "see screenshot", "image": { "data": "***" } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "POST",
            "/api/tickets",
            Some(json!({ "message": "printer jam", "provider": "skynet" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, list) = send(&app, "GET", "/api/tickets", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_upload_and_search() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, created) = send(
            &app,
            "POST",
            "/api/tickets",
            Some(json!({
                "message": "what is this popup",
                "image": { "mimeType": "image/jpeg", "data": BASE64.encode(b"jpeg-bytes") },
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["ticket"]["summary"], "Visual Error Detected");
        assert!(created["ticket"]["raw_issue"]
            .as_str()
            .unwrap()
            .ends_with("[Image Attached]"));

        let id = created["ticket"]["ticket_id"].as_str().unwrap();
        let (status, found) = send(
            &app,
            "GET",
            &format!("/api/tickets/search?q={}", id[4..].to_lowercase()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found[0]["ticket_id"], id);
    }

    #[tokio::test]
    async fn test_reset_and_queue() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        for message in ["internet down again", "smoke from the UPS", "need a mouse"] {
            send(&app, "POST", "/api/tickets", Some(json!({ "message": message }))).await;
        }

        let (_, queue) = send(&app, "GET", "/api/tickets/queue", None).await;
        assert_eq!(queue[0]["urgency"], "Critical");
        assert_eq!(queue.as_array().unwrap().len(), 3);

        let (status, _) = send(&app, "DELETE", "/api/tickets", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, list) = send(&app, "GET", "/api/tickets", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }
}

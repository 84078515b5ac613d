//! Chat routes: the user-simulation page. Each message becomes a ticket
//! and both sides of the exchange are kept in a per-session transcript.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::tickets::{submit, CreateTicketRequest};
use crate::state::{AppState, ChatMessage};
use nexus_classify::ClassifierSource;
use nexus_core::Error;
use nexus_store::{Ticket, TicketStatus};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/{session_id}", get(get_history))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default, rename = "sessionId")]
    session_id: Option<String>,
    #[serde(flatten)]
    ticket: CreateTicketRequest,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    #[serde(rename = "sessionId")]
    session_id: String,
    reply: String,
    ticket: Ticket,
    source: ClassifierSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

/// Assistant message shown under the user's complaint.
fn reply_text(ticket: &Ticket) -> String {
    if ticket.status == TicketStatus::Ignored {
        return ticket.response.clone();
    }
    format!(
        "**Ticket Created!** ({})\n\n{}\n\n*Classified as: {} ({})*",
        ticket.ticket_id, ticket.response, ticket.department, ticket.urgency
    )
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<ChatReply> {
    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let message = req.ticket.message.clone();

    let created = submit(&state, req.ticket).await?;
    let reply = reply_text(&created.ticket);

    state.sessions.push(&session_id, "user", message);
    state.sessions.push(&session_id, "assistant", reply.clone());

    Ok(Json(ChatReply {
        session_id,
        reply,
        ticket: created.ticket,
        source: created.source,
        notice: created.notice,
    }))
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Vec<ChatMessage>> {
    state
        .sessions
        .history(&session_id)
        .map(Json)
        .ok_or_else(|| ApiError(Error::NotFound(format!("chat session {}", session_id))))
}

#[cfg(test)]
mod tests {
    use crate::routes::build_router;
    use crate::test_support::{send, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_chat_keeps_transcript() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, first) = send(
            &app,
            "POST",
            "/api/chat",
            Some(json!({ "message": "Outlook keeps crashing" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let session = first["sessionId"].as_str().unwrap().to_string();
        assert!(first["reply"].as_str().unwrap().contains("Classified as: Hardware (High)"));

        send(
            &app,
            "POST",
            "/api/chat",
            Some(json!({ "sessionId": session, "message": "ok" })),
        )
        .await;

        let (status, history) = send(&app, "GET", &format!("/api/chat/{}", session), None).await;
        assert_eq!(status, StatusCode::OK);
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0]["role"], "user");
        assert_eq!(history[0]["content"], "Outlook keeps crashing");
        assert_eq!(history[1]["role"], "assistant");
        // Too short to act on: the reply is the clarification prompt.
        assert!(!history[3]["content"].as_str().unwrap().contains("Ticket Created"));
    }

    #[tokio::test]
    async fn test_reset_clears_sessions() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (_, reply) = send(
            &app,
            "POST",
            "/api/chat",
            Some(json!({ "sessionId": "s-1", "message": "forgot my password" })),
        )
        .await;
        assert_eq!(reply["sessionId"], "s-1");

        send(&app, "DELETE", "/api/tickets", None).await;
        let (status, _) = send(&app, "GET", "/api/chat/s-1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

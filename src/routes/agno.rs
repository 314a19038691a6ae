//! Chat and session endpoints — thin wrappers over the reverse proxy.
//!
//! Bodies pass through as raw bytes; path parameters are percent-encoded
//! before interpolation into the upstream path.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use bytes::Bytes;

use crate::Result;
use crate::router::AppState;

/// `POST /api/agno/chat/completions`
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    state.proxy.post("/chat/completions", &headers, body).await
}

/// `GET /api/agno/sessions/{agent_id}`
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Response> {
    state
        .proxy
        .get(&format!("/sessions/{}", urlencoding::encode(&agent_id)))
        .await
}

/// `GET /api/agno/sessions/{agent_id}/{session_id}`
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path((agent_id, session_id)): Path<(String, String)>,
) -> Result<Response> {
    state
        .proxy
        .get(&format!(
            "/sessions/{}/{}",
            urlencoding::encode(&agent_id),
            urlencoding::encode(&session_id)
        ))
        .await
}

/// `DELETE /api/agno/sessions/{agent_id}/{session_id}`
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path((agent_id, session_id)): Path<(String, String)>,
) -> Result<Response> {
    state
        .proxy
        .delete(&format!(
            "/sessions/{}/{}",
            urlencoding::encode(&agent_id),
            urlencoding::encode(&session_id)
        ))
        .await
}

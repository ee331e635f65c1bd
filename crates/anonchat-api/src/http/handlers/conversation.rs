//! Conversation endpoints.
//!
//! GET    /conversation/{session_id} - working history for the requesting IP
//! DELETE /conversation/{session_id} - drop the transcript
//!
//! Both are scoped by client IP: one client cannot read or delete another
//! client's session even with a guessed session id.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use anonchat_types::chat::Turn;

use crate::http::error::ApiError;
use crate::http::extractors::client_ip::ClientIp;
use crate::state::AppState;

/// Response body for history retrieval.
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub session_id: String,
    pub conversation_history: Vec<Turn>,
    pub message_count: usize,
}

/// Response body for deletion.
#[derive(Debug, Serialize)]
pub struct DeleteConversationResponse {
    pub session_id: String,
    pub deleted: bool,
}

/// GET /conversation/{session_id} - fetch the trimmed working history.
pub async fn get_conversation(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    Path(session_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let history = state.conversations.get_history(&ip_address, &session_id).await?;

    Ok(Json(ConversationResponse {
        session_id,
        message_count: history.len(),
        conversation_history: history,
    }))
}

/// DELETE /conversation/{session_id} - delete the transcript.
pub async fn delete_conversation(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteConversationResponse>, ApiError> {
    let deleted = state
        .conversations
        .delete_conversation(&ip_address, &session_id)
        .await?;

    Ok(Json(DeleteConversationResponse { session_id, deleted }))
}

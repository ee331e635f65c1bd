//! Chat endpoint.
//!
//! POST /chat
//!
//! Sequence: resolve client IP -> rate limiter -> fetch history -> Gemini
//! call -> persist the exchange -> respond with the text and updated quota.
//! Provider failures become themed fallback text, never raw provider
//! errors; the exchange is recorded whenever some response text (real or
//! fallback) was produced. Storage failures abort the request with a 5xx.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use anonchat_observe::genai_attrs;
use anonchat_types::error::AiError;
use anonchat_types::rate_limit::RateLimitStatus;

use crate::http::error::ApiError;
use crate::http::extractors::client_ip::ClientIp;
use crate::state::AppState;

/// Longest accepted user message, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user message.
    pub message: String,
    /// Session ID for conversation continuity; generated when absent.
    pub session_id: Option<String>,
}

/// Response body for the chat endpoint.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub remaining_requests: u32,
    pub rate_limit_info: RateLimitStatus,
}

/// POST /chat - relay a message to Gemini with conversation context.
pub async fn chat(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let ai = state.ai.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable(
            "AI service unavailable. The collective's consciousness is temporarily offline."
                .to_string(),
        )
    })?;

    if body.message.is_empty() {
        return Err(ApiError::Validation("message must not be empty".to_string()));
    }
    if body.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::Validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let limit = state.config.rate_limit.hourly_limit;
    let decision = state.limiter.check_and_consume(&ip_address, limit).await?;
    if !decision.allowed {
        let info = state.limiter.info(&ip_address).await?;
        return Err(ApiError::RateLimited { info, limit });
    }

    let session_id = body
        .session_id
        .filter(|sid| !sid.is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let history = state.conversations.get_history(&ip_address, &session_id).await?;

    let span = info_span!(
        "gen_ai.chat",
        gen_ai.operation.name = genai_attrs::OP_CHAT,
        gen_ai.provider.name = genai_attrs::PROVIDER_GEMINI,
        gen_ai.request.model = ai.model(),
    );
    let response_text = match ai.generate(&body.message, &history).instrument(span).await {
        Ok(text) => text,
        Err(err) => {
            warn!(%err, "generation failed, substituting fallback text");
            fallback_text(&err)
        }
    };

    state
        .conversations
        .append_exchange(&ip_address, &session_id, &body.message, &response_text)
        .await?;

    let rate_limit_info = state.limiter.info(&ip_address).await?;

    Ok(Json(ChatResponse {
        response: response_text,
        session_id,
        remaining_requests: decision.remaining,
        rate_limit_info,
    }))
}

/// User-safe stand-in text for a failed generation.
fn fallback_text(err: &AiError) -> String {
    match err {
        AiError::QuotaExceeded => {
            "The collective is experiencing high demand. Please try again in a moment, \
             fellow digital warrior."
                .to_string()
        }
        AiError::SafetyBlocked(_) => {
            "Your query has triggered our safety protocols. The collective values \
             responsible discourse - please rephrase your question."
                .to_string()
        }
        AiError::AuthenticationFailed => {
            "The collective's neural networks are temporarily unavailable. \
             The administrators have been notified."
                .to_string()
        }
        other => {
            let detail: String = other.to_string().chars().take(100).collect();
            format!(
                "An anomaly has occurred in the matrix: {detail}... \
                 The collective will adapt and overcome."
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_text_per_error_kind() {
        assert!(fallback_text(&AiError::QuotaExceeded).contains("high demand"));
        assert!(
            fallback_text(&AiError::SafetyBlocked("SAFETY".to_string()))
                .contains("safety protocols")
        );
        assert!(fallback_text(&AiError::AuthenticationFailed).contains("temporarily unavailable"));
        assert!(fallback_text(&AiError::EmptyResponse).contains("anomaly"));
    }

    #[test]
    fn test_fallback_text_truncates_detail() {
        let err = AiError::Provider {
            message: "x".repeat(500),
        };
        let text = fallback_text(&err);
        assert!(text.len() < 250);
    }
}

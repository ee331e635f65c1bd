//! Service banner, health check, and model info endpoints.
//!
//! GET / - banner
//! GET /health - component availability
//! GET /model-info - configured generation settings

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::http::error::ApiError;
use crate::state::AppState;

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub gemini_available: bool,
    pub database_connected: bool,
}

/// GET / - service banner.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Anonymous Chat Backend is running",
        "status": "We are Anonymous. We are Legion.",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health - component availability. `degraded` when either the
/// provider is unconfigured or the database is unreachable.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheck> {
    let gemini_available = state.ai.is_some();
    let database_connected = sqlx::query("SELECT 1")
        .execute(&state.db_pool.reader)
        .await
        .is_ok();

    let status = if gemini_available && database_connected {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthCheck {
        status: status.to_string(),
        gemini_available,
        database_connected,
    })
}

/// GET /model-info - generation settings of the configured provider.
pub async fn model_info(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let ai = state.ai.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("AI service unavailable".to_string())
    })?;

    Ok(Json(json!({
        "model_name": ai.model(),
        "temperature": state.config.ai.temperature,
        "max_tokens": state.config.ai.max_output_tokens,
        "safety_settings_enabled": true,
    })))
}

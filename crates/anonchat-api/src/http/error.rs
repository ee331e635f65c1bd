//! Application error type mapping to HTTP status codes and JSON bodies.
//!
//! Storage failures always surface as 5xx -- the service never proceeds on
//! stale or default state. Rate-limit exhaustion is not an error in the
//! core; it becomes one here, as a 429 carrying quota-reset metadata.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use anonchat_types::error::StorageError;
use anonchat_types::rate_limit::RateLimitStatus;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Quota exhausted for the requesting IP.
    RateLimited { info: RateLimitStatus, limit: u32 },
    /// Request body failed validation.
    Validation(String),
    /// A required backing service is not configured.
    ServiceUnavailable(String),
    /// Durable storage failure.
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::RateLimited { info, limit } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Rate limit exceeded",
                    "message": format!(
                        "You have exceeded the limit of {limit} requests per hour. \
                         The collective values thoughtful discourse over spam."
                    ),
                    "rate_limit_info": info,
                }),
            ),
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Validation error",
                    "message": message,
                }),
            ),
            ApiError::ServiceUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "Service unavailable",
                    "message": message,
                }),
            ),
            ApiError::Storage(err) => {
                error!(%err, "storage failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Internal server error",
                        "message": "An anomaly has occurred in the matrix. \
                                    The collective will adapt and overcome.",
                    }),
                )
            }
        };

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

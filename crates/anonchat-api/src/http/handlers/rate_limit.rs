//! Rate-limit info endpoint.
//!
//! GET /rate-limit-info
//!
//! Read-only: reports usage for the requesting IP without consuming quota.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use anonchat_types::rate_limit::RateLimitStatus;

use crate::http::error::ApiError;
use crate::http::extractors::client_ip::ClientIp;
use crate::state::AppState;

/// Response body: quota usage plus the configured limit.
#[derive(Debug, Serialize)]
pub struct RateLimitInfoResponse {
    #[serde(flatten)]
    pub info: RateLimitStatus,
    pub limit: u32,
}

/// GET /rate-limit-info - quota usage for the requesting IP.
pub async fn rate_limit_info(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
) -> Result<Json<RateLimitInfoResponse>, ApiError> {
    let info = state.limiter.info(&ip_address).await?;

    Ok(Json(RateLimitInfoResponse {
        info,
        limit: state.config.rate_limit.hourly_limit,
    }))
}

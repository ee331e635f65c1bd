//! Axum router configuration with middleware.
//!
//! Middleware: CORS, request tracing. Rate limiting is enforced inside the
//! chat handler only -- the read-only endpoints never consume quota.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/model-info", get(handlers::health::model_info))
        .route("/rate-limit-info", get(handlers::rate_limit::rate_limit_info))
        .route("/chat", post(handlers::chat::chat))
        .route(
            "/conversation/{session_id}",
            get(handlers::conversation::get_conversation)
                .delete(handlers::conversation::delete_conversation),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

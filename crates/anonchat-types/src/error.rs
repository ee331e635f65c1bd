use thiserror::Error;

/// Errors from the durable storage layer.
///
/// Always propagated to the caller -- a storage failure fails the request
/// rather than proceeding on stale or default state. The single exception
/// (a corrupt serialized history payload degrading to an empty history)
/// is handled inside the conversation store, not expressed here.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("storage operation timed out")]
    Timeout,
}

/// Errors from the external text-generation call.
///
/// Opaque to the core: no retries, no state mutation. The HTTP handler maps
/// these to user-safe fallback text instead of surfacing provider output.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("provider quota exhausted")]
    QuotaExceeded,

    #[error("request blocked by safety filter: {0}")]
    SafetyBlocked(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("provider returned no candidates")]
    EmptyResponse,
}

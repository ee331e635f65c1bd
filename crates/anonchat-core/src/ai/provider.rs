//! AiProvider trait definition.
//!
//! The single seam to the external text-generation service. The core
//! treats any failure as opaque: no retries, no fallback text -- that is
//! the HTTP handler's job.

use anonchat_types::chat::Turn;
use anonchat_types::error::AiError;

/// Trait for text-generation backends (Gemini in production, scripted
/// fakes in tests).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in anonchat-infra (e.g., `GeminiProvider`).
pub trait AiProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier this provider targets.
    fn model(&self) -> &str;

    /// Generate a response to `message` given the prior conversation.
    fn generate(
        &self,
        message: &str,
        history: &[Turn],
    ) -> impl std::future::Future<Output = Result<String, AiError>> + Send;
}

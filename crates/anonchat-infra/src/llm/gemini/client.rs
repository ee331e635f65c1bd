//! GeminiProvider -- concrete [`AiProvider`] implementation for Google
//! Gemini.
//!
//! Sends requests to the Generative Language API
//! (`/v1beta/models/{model}:generateContent`). The API key is wrapped in
//! [`secrecy::SecretString`] and is never logged or included in `Debug`
//! output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use anonchat_core::ai::AiProvider;
use anonchat_types::chat::{MessageRole, Turn};
use anonchat_types::config::AiConfig;
use anonchat_types::error::AiError;

use super::types::{
    GeminiContent, GeminiGenerationConfig, GeminiRequest, GeminiResponse, GeminiSafetySetting,
};
use super::SYSTEM_PROMPT;

/// The four harm categories moderated at BLOCK_MEDIUM_AND_ABOVE.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Google Gemini provider.
///
/// Implements [`AiProvider`] for the generateContent API. Conversation
/// history maps onto Gemini roles (`assistant` becomes `model`); the
/// persona system prompt rides along as `systemInstruction`.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    config: AiConfig,
    system_instruction: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the default persona instruction.
    pub fn new(api_key: SecretString, config: AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            config,
            system_instruction: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the persona instruction.
    pub fn with_system_instruction(mut self, instruction: String) -> Self {
        self.system_instruction = instruction;
        self
    }

    /// Generation settings in use.
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.config.model
        )
    }

    /// Build the wire request from a message and its conversation context.
    fn build_request(&self, message: &str, history: &[Turn]) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                GeminiContent::text(Some(role), turn.content.clone())
            })
            .collect();
        contents.push(GeminiContent::text(Some("user"), message));

        GeminiRequest {
            system_instruction: Some(GeminiContent::text(None, self.system_instruction.clone())),
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| GeminiSafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
                })
                .collect(),
        }
    }

    /// Extract the generated text from a parsed response.
    fn extract_text(response: GeminiResponse) -> Result<String, AiError> {
        if let Some(feedback) = &response.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(AiError::SafetyBlocked(reason.clone()));
            }
        }

        let candidate = response.candidates.into_iter().next().ok_or(AiError::EmptyResponse)?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(AiError::SafetyBlocked("SAFETY".to_string()));
        }

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        Ok(text)
    }
}

// GeminiProvider intentionally does NOT derive Debug. The SecretString
// field ensures the API key is never printed, but Debug is omitted
// entirely as well.

impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, message: &str, history: &[Turn]) -> Result<String, AiError> {
        let body = self.build_request(message, history);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => AiError::AuthenticationFailed,
                429 => AiError::QuotaExceeded,
                _ => AiError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let gemini_resp: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiError::Deserialization(format!("failed to parse response: {e}")))?;

        Self::extract_text(gemini_resp)
    }
}

//! Service configuration types.
//!
//! `ServiceConfig` represents the top-level `config.toml` that controls the
//! HTTP listener, rate limiting, retention, and the Gemini model settings.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the anonchat service.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per IP per hourly window.
    #[serde(default = "default_hourly_limit")]
    pub hourly_limit: u32,
}

fn default_hourly_limit() -> u32 {
    3
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            hourly_limit: default_hourly_limit(),
        }
    }
}

/// Retention settings for sessions and audit entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Sessions and audit entries older than this many days are purged
    /// at startup.
    #[serde(default = "default_retention_days")]
    pub days: i64,
}

fn default_retention_days() -> i64 {
    7
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_retention_days(),
        }
    }
}

/// Gemini generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.8
}

fn default_top_k() -> u32 {
    64
}

fn default_max_output_tokens() -> u32 {
    4096
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_default_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.rate_limit.hourly_limit, 3);
        assert_eq!(config.retention.days, 7);
        assert_eq!(config.ai.model, "gemini-2.0-flash-exp");
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.rate_limit.hourly_limit, 3);
        assert!((config.ai.temperature - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml_str = r#"
[server]
port = 9000

[rate_limit]
hourly_limit = 10

[ai]
model = "gemini-2.5-pro"
"#;
        let config: ServiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.rate_limit.hourly_limit, 10);
        assert_eq!(config.retention.days, 7);
        assert_eq!(config.ai.model, "gemini-2.5-pro");
        assert_eq!(config.ai.max_output_tokens, 4096);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = ServiceConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ServiceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.ai.top_k, config.ai.top_k);
    }
}

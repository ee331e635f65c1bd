//! Service configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.anonchat/` in
//! production) and deserializes it into [`ServiceConfig`]. Falls back to
//! the built-in defaults when the file is missing or malformed.

use std::path::Path;

use anonchat_types::config::ServiceConfig;

/// Load the service configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ServiceConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_service_config(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_service_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_service_config(tmp.path()).await;
        assert_eq!(config.rate_limit.hourly_limit, 3);
        assert_eq!(config.retention.days, 7);
    }

    #[tokio::test]
    async fn load_service_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[server]
port = 9100

[rate_limit]
hourly_limit = 5

[retention]
days = 30
"#,
        )
        .await
        .unwrap();

        let config = load_service_config(tmp.path()).await;
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.rate_limit.hourly_limit, 5);
        assert_eq!(config.retention.days, 30);
        assert_eq!(config.ai.model, "gemini-2.0-flash-exp");
    }

    #[tokio::test]
    async fn load_service_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_service_config(tmp.path()).await;
        assert_eq!(config.rate_limit.hourly_limit, 3);
    }
}

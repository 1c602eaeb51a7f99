//! Gateway configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.promptgate/` in
//! production) and deserializes it into [`GatewayConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use promptgate_types::config::GatewayConfig;

/// Resolve the data directory: `PROMPTGATE_DATA_DIR`, else `~/.promptgate`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var("PROMPTGATE_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".promptgate")
        }
    }
}

/// Load gateway configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GatewayConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> GatewayConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
    };

    match toml::from_str::<GatewayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GatewayConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptgate_types::config::QuotaWindow;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.quota.token_limit, 1_000_000);
        assert_eq!(config.reserved_output_tokens, 1_000);
    }

    #[tokio::test]
    async fn valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
reserved_output_tokens = 2000

[quota]
window = { rolling_hours = 24 }
token_limit = 250000

[[pricing]]
model_pattern = "gpt-4o"
input_cost_per_million = 2.5
output_cost_per_million = 10.0
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.reserved_output_tokens, 2_000);
        assert_eq!(config.quota.window, QuotaWindow::RollingHours(24));
        assert_eq!(config.quota.token_limit, 250_000);
        assert_eq!(config.pricing.len(), 1);
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.quota.token_limit, 1_000_000);
        assert!(config.pricing.is_empty());
    }
}

pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod onboard;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};

use hclaudit_config::AppConfig;

/// Load the configuration with environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// The config file in effect: `--config` or the default location.
pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

/// Whether the configured provider has what it needs to authenticate:
/// an API key, or a local backend that runs without one.
pub fn credentials_ready(config: &AppConfig) -> bool {
    config.has_api_key() || hclaudit_providers::router::is_local(&config.provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_provider_needs_no_key() {
        let config = AppConfig {
            provider: "ollama".into(),
            api_key: None,
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
        assert!(credentials_ready(&config));
    }

    #[test]
    fn hosted_provider_needs_a_key() {
        let mut config = AppConfig {
            provider: "gemini".into(),
            api_key: None,
            ..AppConfig::default()
        };
        assert!(!credentials_ready(&config));

        config.api_key = Some("AIza-test".into());
        assert!(credentials_ready(&config));
    }
}

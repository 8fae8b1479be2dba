//! Configuration loading, validation, and management for hclaudit.
//!
//! Loads configuration from `~/.hclaudit/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Matrix files expected by default, in prompt order.
pub const DEFAULT_MATRICES: [(&str, &str); 3] = [
    ("Matriz 1", "Matriz_Ambiental_Corregida_Seccion_1.csv"),
    ("Matriz 2", "Matriz_Ambiental_Corregida_Seccion_2.csv"),
    ("What-If", "Matriz_What_If_Corregida_Seccion_2.csv"),
];

/// Diagram image shown next to the chat.
pub const DEFAULT_DIAGRAM: &str = "DTI Proceso HCl Sección 1.jpg";

/// The root configuration structure.
///
/// Maps directly to `~/.hclaudit/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the default provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generative-model provider ("gemini", "openai", "ollama", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; unset means the provider's own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Max output tokens; unset means the provider's own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Matrix and diagram locations
    #[serde(default)]
    pub data: DataConfig,

    /// Dashboard server configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific overrides (api key, base URL)
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("data", &self.data)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

/// One matrix table: the label it is introduced with in the prompt and the
/// CSV file it is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub label: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory the matrix and diagram files are resolved against
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Piping-and-instrumentation diagram image
    #[serde(default = "default_diagram")]
    pub diagram: String,

    /// Rows shown in the dashboard's data preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// The three matrices, in prompt order (env-1, env-2, what-if)
    #[serde(default = "default_matrices")]
    pub matrices: Vec<MatrixEntry>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_matrices() -> Vec<MatrixEntry> {
    DEFAULT_MATRICES
        .iter()
        .map(|(label, file)| MatrixEntry {
            label: (*label).into(),
            file: (*file).into(),
        })
        .collect()
}
fn default_diagram() -> String {
    DEFAULT_DIAGRAM.into()
}
fn default_preview_rows() -> usize {
    3
}

impl DataConfig {
    /// Absolute-or-relative paths of the matrix files, in prompt order.
    pub fn matrix_paths(&self) -> Vec<PathBuf> {
        self.matrices.iter().map(|m| self.dir.join(&m.file)).collect()
    }

    pub fn diagram_path(&self) -> PathBuf {
        self.dir.join(&self.diagram)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            diagram: default_diagram(),
            preview_rows: default_preview_rows(),
            matrices: default_matrices(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default location when `None`,
    /// then apply environment overrides:
    /// - `GEMINI_API_KEY`, then `HCLAUDIT_API_KEY` (only when no key is configured)
    /// - `HCLAUDIT_PROVIDER`, `HCLAUDIT_MODEL`, `HCLAUDIT_DATA_DIR`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = env("GEMINI_API_KEY").or_else(|| env("HCLAUDIT_API_KEY"));
        }
        if let Some(provider) = env("HCLAUDIT_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = env("HCLAUDIT_MODEL") {
            self.model = model;
        }
        if let Some(dir) = env("HCLAUDIT_DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hclaudit")
    }

    /// Default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.data.matrices.len() != DEFAULT_MATRICES.len() {
            return Err(ConfigError::ValidationError(format!(
                "exactly {} matrices are required, found {}",
                DEFAULT_MATRICES.len(),
                self.data.matrices.len()
            )));
        }

        if let Some(m) = self
            .data
            .matrices
            .iter()
            .find(|m| m.label.trim().is_empty() || m.file.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(format!(
                "matrix entry {m:?} needs both a label and a file"
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        Ok(())
    }

    /// API key for the active provider: provider-specific first, then global.
    pub fn provider_api_key(&self) -> Option<String> {
        self.providers
            .get(&self.provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider_api_key().is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            temperature: None,
            max_tokens: None,
            data: DataConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.data.matrices.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn matrix_paths_follow_prompt_order() {
        let config = AppConfig::default();
        let paths = config.data.matrix_paths();
        assert!(paths[0].ends_with("Matriz_Ambiental_Corregida_Seccion_1.csv"));
        assert!(paths[1].ends_with("Matriz_Ambiental_Corregida_Seccion_2.csv"));
        assert!(paths[2].ends_with("Matriz_What_If_Corregida_Seccion_2.csv"));
        assert!(config.data.diagram_path().ends_with(DEFAULT_DIAGRAM));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.data.matrices, config.data.matrices);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: Some(5.0),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn wrong_matrix_count_rejected() {
        let mut config = AppConfig::default();
        config.data.matrices.pop();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exactly 3"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn load_from_file_with_custom_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "gemini-1.5-pro"

[data]
dir = "/srv/plant"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.data.dir, PathBuf::from("/srv/plant"));
        assert_eq!(config.data.matrices.len(), 3);
    }

    #[test]
    fn unparsable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "GEMINI_API_KEY" => Some("g-key".into()),
            "HCLAUDIT_API_KEY" => Some("other".into()),
            "HCLAUDIT_MODEL" => Some("gemini-2.0-flash".into()),
            "HCLAUDIT_DATA_DIR" => Some("/data".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.data.dir, PathBuf::from("/data"));
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "GEMINI_API_KEY" => Some("  ".into()),
            _ => None,
        });
        assert!(!config.has_api_key());
    }

    #[test]
    fn configured_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_overrides(|_| Some("from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn provider_specific_key_takes_precedence() {
        let mut config = AppConfig {
            api_key: Some("global".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                api_key: Some("specific".into()),
                api_url: None,
            },
        );
        assert_eq!(config.provider_api_key().as_deref(), Some("specific"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let text = format!("{config:?}");
        assert!(!text.contains("super-secret"));
        assert!(text.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-1.5-flash"));
        assert!(toml_str.contains("Matriz_What_If_Corregida_Seccion_2.csv"));
    }
}

//! # Configuration
//!
//! `diores.toml` layout:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! rate_limit = 100
//! cors_origins = ["http://localhost:5173"]
//!
//! [prediction]
//! base_url = "http://localhost:8000"
//! endpoint = "/predict_v2"
//! timeout_secs = 10
//!
//! [validation]
//! enforce_required = false
//!
//! [payload]
//! exam_year = 2018
//! attempt_count = 1
//! result_group = 1
//! ```
//!
//! Every section is optional. Environment variables override the file:
//! - `DIORES_PREDICTION_URL`: prediction service base URL
//! - `DIORES_API_KEY`: bearer key required by the HTTP API
//! - `DIORES_RATE_LIMIT`: requests per second (0 disables)
//! - `DIORES_CORS_ORIGINS`: comma-separated origins, or "*"

use diores_core::{DioresError, PayloadConstants, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "diores.toml";

/// Maximum config file size (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Allowed CORS origins. `None` means localhost only; `["*"]` allows all.
    pub cors_origins: Option<Vec<String>>,
    /// Bearer key required on every endpoint but `/health`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: 100,
            cors_origins: None,
            api_key: None,
        }
    }
}

/// Remote prediction service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub base_url: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Bearer token sent to the prediction service, if it wants one.
    pub api_key: Option<String>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoint: "/predict_v2".to_string(),
            timeout_secs: 10,
            api_key: None,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub prediction: PredictionConfig,
    pub validation: ValidationPolicy,
    pub payload: PayloadConstants,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, DioresError> {
        toml::from_str(text).map_err(|e| DioresError::ConfigError(e.to_string()))
    }

    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when it
    /// exists, or fall back to defaults. Environment overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self, DioresError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };
        Ok(config.with_env_overrides())
    }

    fn from_file(path: &Path) -> Result<Self, DioresError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            DioresError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(DioresError::ConfigError(format!(
                "{} exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            DioresError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        tracing::info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Apply `DIORES_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("DIORES_PREDICTION_URL").filter(|u| !u.trim().is_empty()) {
            self.prediction.base_url = url.trim().to_string();
        }
        if let Some(key) = lookup("DIORES_API_KEY").filter(|k| !k.is_empty()) {
            self.server.api_key = Some(key);
        }
        if let Some(limit) = lookup("DIORES_RATE_LIMIT") {
            match limit.trim().parse() {
                Ok(limit) => self.server.rate_limit = limit,
                Err(_) => tracing::warn!("Ignoring invalid DIORES_RATE_LIMIT '{}'", limit),
            }
        }
        if let Some(origins) = lookup("DIORES_CORS_ORIGINS") {
            let parsed: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.server.cors_origins = Some(parsed);
            }
        }
        self
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = AppConfig::from_toml_str("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.prediction.endpoint, "/predict_v2");
        assert_eq!(config.payload.exam_year, 2018);
        assert!(!config.validation.enforce_required);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [validation]
            enforce_required = true
            "#,
        )
        .expect("parse");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.validation.enforce_required);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let result = AppConfig::from_toml_str("[server\nport = ");
        assert!(matches!(result, Err(DioresError::ConfigError(_))));
    }

    #[test]
    fn load_reads_the_given_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[prediction]\nbase_url = \"http://predict.test\"\ntimeout_secs = 3")
            .expect("write");

        let config = AppConfig::from_file(file.path()).expect("load");
        assert_eq!(config.prediction.base_url, "http://predict.test");
        assert_eq!(config.prediction.timeout_secs, 3);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/diores.toml")));
        assert!(matches!(result, Err(DioresError::ConfigError(_))));
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = AppConfig::default().with_overrides(|key| match key {
            "DIORES_PREDICTION_URL" => Some("http://override:8000".to_string()),
            "DIORES_RATE_LIMIT" => Some("0".to_string()),
            "DIORES_API_KEY" => Some("secret".to_string()),
            "DIORES_CORS_ORIGINS" => Some("http://a.test, http://b.test".to_string()),
            _ => None,
        });
        assert_eq!(config.prediction.base_url, "http://override:8000");
        assert_eq!(config.server.rate_limit, 0);
        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.server.cors_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn invalid_rate_limit_override_is_ignored() {
        let config = AppConfig::default().with_overrides(|key| {
            (key == "DIORES_RATE_LIMIT").then(|| "fast".to_string())
        });
        assert_eq!(config.server.rate_limit, 100);
    }
}

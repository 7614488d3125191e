//! Server configuration
//!
//! Layered with the `config` crate, lowest precedence first:
//! built-in defaults, an optional YAML file, `NEWSCHECK_*` environment
//! variables (`__` separates nested keys), and the platform `PORT` variable.
//! Command-line overrides are applied on top by the binary.

use newscheck_classifiers::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file, read only if present
pub const DEFAULT_CONFIG_FILE: &str = "newscheck.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allow every origin, method and header
    #[serde(default = "default_true")]
    pub allow_any_origin: bool,

    /// Origins allowed when `allow_any_origin` is off
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: true,
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServerConfig {
    /// Load configuration.
    ///
    /// An explicitly named file must exist; otherwise [`DEFAULT_CONFIG_FILE`]
    /// is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        Self::builder(&file, required)?
            .set_override_option("port", std::env::var("PORT").ok())?
            .build()?
            .try_deserialize()
    }

    fn builder(
        file: &Path,
        required: bool,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        Ok(config::Config::builder()
            .set_default("listen", default_listen())?
            .set_default("port", i64::from(default_port()))?
            .add_source(config::File::from(file).required(required))
            .add_source(
                config::Environment::with_prefix("NEWSCHECK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ))
    }

    /// Load from a YAML string, ignoring the environment
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert!(config.cors.allow_any_origin);
        assert!(config.metrics.enabled);
        assert!(config.detector.fallback.enabled);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
listen: 127.0.0.1
port: 9000
cors:
  allow_any_origin: false
  allowed_origins: ["http://localhost:3000"]
metrics:
  enabled: false
detector:
  model_paths:
    - path: models/custom.json
  fallback:
    enabled: false
"#;
        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert!(!config.metrics.enabled);
        assert_eq!(config.detector.model_paths.len(), 1);
        assert!(!config.detector.fallback.enabled);
    }

    #[test]
    fn test_load_file_through_config_builder() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "listen: 127.0.0.1\ncors:\n  allow_any_origin: false").unwrap();

        let config = ServerConfig::builder(file.path(), true)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<ServerConfig>()
            .unwrap();
        assert_eq!(config.listen, "127.0.0.1");
        assert!(!config.cors.allow_any_origin);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(ServerConfig::load(Some(Path::new("/nonexistent/newscheck.yaml"))).is_err());
    }
}

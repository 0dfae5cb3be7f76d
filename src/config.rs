//! # Service Configuration
//!
//! Loaded from a JSON file (`storyshelf.json` by default). Every field has a
//! default, so `{}` is a valid configuration serving an empty catalog.
//!
//! ```json
//! {
//!   "http": { "host": "0.0.0.0", "port": 8080, "cors_origins": ["*"] },
//!   "query": { "default_page_size": 25, "max_page_size": 100 },
//!   "markdown": { "max_length": 100000 },
//!   "seed_path": "catalog.json",
//!   "log_level": "info"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::markdown::MarkdownConfig;
use crate::observability::Severity;
use crate::query::{QueryLimits, MAX_PAGE_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub query: QueryLimits,

    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// Catalog seed file; relative paths resolve against the config file
    #[serde(default)]
    pub seed_path: Option<PathBuf>,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            query: QueryLimits::default(),
            markdown: MarkdownConfig::default(),
            seed_path: None,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;

        if let Some(seed) = &config.seed_path {
            if seed.is_relative() {
                if let Some(dir) = path.parent() {
                    config.seed_path = Some(dir.join(seed));
                }
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let query = &self.query;
        if query.max_page_size == 0 || query.max_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::invalid(
                "query.max_page_size",
                format!("must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
        if query.default_page_size == 0 || query.default_page_size > query.max_page_size {
            return Err(ConfigError::invalid(
                "query.default_page_size",
                format!("must be between 1 and {}", query.max_page_size),
            ));
        }
        if query.max_search_length == 0 {
            return Err(ConfigError::invalid("query.max_search_length", "must be > 0"));
        }

        if self.markdown.max_length == 0 {
            return Err(ConfigError::invalid("markdown.max_length", "must be > 0"));
        }

        if self.http.host.trim().is_empty() {
            return Err(ConfigError::invalid("http.host", "must not be empty"));
        }

        self.severity()?;
        Ok(())
    }

    pub fn severity(&self) -> Result<Severity, ConfigError> {
        self.log_level
            .parse()
            .map_err(|reason: String| ConfigError::invalid("log_level", reason))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write_config(dir: &TempDir, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join("storyshelf.json");
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({}));

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.query.default_page_size, 50);
        assert_eq!(config.query.max_page_size, 200);
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_seed_path_resolves_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "seed_path": "catalog.json" }));

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.seed_path, Some(dir.path().join("catalog.json")));
    }

    #[test]
    fn test_page_size_bounds_validated() {
        let dir = TempDir::new().unwrap();

        let path = write_config(&dir, json!({ "query": { "max_page_size": 500 } }));
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "query.max_page_size", .. }));

        let path = write_config(
            &dir,
            json!({ "query": { "max_page_size": 20, "default_page_size": 50 } }),
        );
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "query.default_page_size", .. }));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "log_level": "loud" }));
        assert!(matches!(
            AppConfig::load(&path).unwrap_err(),
            ConfigError::Invalid { field: "log_level", .. }
        ));
    }

    #[test]
    fn test_malformed_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storyshelf.json");
        assert!(matches!(AppConfig::load(&path).unwrap_err(), ConfigError::Read { .. }));

        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(AppConfig::load(&path).unwrap_err(), ConfigError::Parse(_)));
    }
}

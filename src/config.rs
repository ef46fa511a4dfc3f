//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,

    #[serde(default = "default_journal_enabled")]
    pub journal_enabled: bool,

    #[serde(default = "default_snapshot_threshold")]
    pub snapshot_threshold: u64,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("arregmatica").to_string_lossy().to_string())
        .unwrap_or_else(|| "./arregmatica_data".to_string())
}

fn default_flush_interval() -> u64 {
    5000 // 5 seconds
}

fn default_journal_enabled() -> bool {
    true
}

fn default_snapshot_threshold() -> u64 {
    10_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            flush_interval_ms: default_flush_interval(),
            journal_enabled: default_journal_enabled(),
            snapshot_threshold: default_snapshot_threshold(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8088
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:8090".to_string(),
                "http://127.0.0.1:8090".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Text model gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Enable the writing tools; without it they answer 503
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_model_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model_name")]
    pub model: String,

    #[serde(default = "default_model_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_model_retries")]
    pub max_retries: u32,
}

fn default_model_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_model_name() -> String {
    "text-standard".to_string()
}

fn default_model_timeout() -> u64 {
    30_000
}

fn default_model_retries() -> u32 {
    2
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_model_url(),
            api_key: String::new(),
            model: default_model_name(),
            request_timeout_ms: default_model_timeout(),
            max_retries: default_model_retries(),
        }
    }
}

/// Media store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_dir")]
    pub root_dir: String,

    #[serde(default = "default_media_max_bytes")]
    pub max_bytes: usize,
}

fn default_media_dir() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("arregmatica")
                .join("media")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./arregmatica_data/media".to_string())
}

fn default_media_max_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root_dir: default_media_dir(),
            max_bytes: default_media_max_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("arregmatica").join("config.toml")),
            Some(PathBuf::from("/etc/arregmatica/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Store overrides
        if let Ok(data_dir) = std::env::var("ARREGMATICA_DATA_DIR") {
            self.store.data_dir = data_dir;
        }

        // API overrides
        if let Ok(host) = std::env::var("ARREGMATICA_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("ARREGMATICA_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Model gateway overrides; setting the URL also enables the tools
        if let Ok(url) = std::env::var("ARREGMATICA_MODEL_URL") {
            self.model.url = url;
            self.model.enabled = true;
        }
        if let Ok(key) = std::env::var("ARREGMATICA_MODEL_KEY") {
            self.model.api_key = key;
        }
        if let Ok(model) = std::env::var("ARREGMATICA_MODEL_NAME") {
            self.model.model = model;
        }

        // Media overrides
        if let Ok(dir) = std::env::var("ARREGMATICA_MEDIA_DIR") {
            self.media.root_dir = dir;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("ARREGMATICA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ARREGMATICA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            api: ApiConfig::default(),
            model: ModelConfig::default(),
            media: MediaConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Arregmatica Configuration
#
# Environment variables override these settings:
# - ARREGMATICA_DATA_DIR
# - ARREGMATICA_API_HOST
# - ARREGMATICA_API_PORT
# - ARREGMATICA_MODEL_URL (setting it enables the writing tools)
# - ARREGMATICA_MODEL_KEY
# - ARREGMATICA_MODEL_NAME
# - ARREGMATICA_MEDIA_DIR
# - ARREGMATICA_LOG_LEVEL
# - ARREGMATICA_LOG_FORMAT

[store]
# Directory for the document tree, journal and snapshots
data_dir = "~/.local/share/arregmatica"

# How often to flush the journal and snapshot (ms)
flush_interval_ms = 5000

# Enable the write journal for durability
journal_enabled = true

# Snapshot after this many journal entries
snapshot_threshold = 10000

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8088

# Allowed CORS origins
cors_origins = ["http://localhost:8090", "http://127.0.0.1:8090"]

# Request timeout in seconds
request_timeout_secs = 30

[model]
# Enable the writing tools
enabled = false

# Text model gateway URL
url = "http://localhost:8090"

# API key, sent as a query parameter when non-empty
api_key = ""

# Model identifier
model = "text-standard"

# Per-request timeout (ms)
request_timeout_ms = 30000

# Retries on transient failures
max_retries = 2

[media]
# Directory for uploaded images
root_dir = "~/.local/share/arregmatica/media"

# Maximum upload size in bytes
max_bytes = 5242880

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/arregmatica/arregmatica.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8088);
        assert!(config.store.journal_enabled);
        assert!(!config.model.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_generated_config_parses() {
        let text = generate_default_config();
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.api.port, 8088);
        assert_eq!(config.media.max_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str("[api]\nport = 9999\n").unwrap();
        assert_eq!(config.api.port, 9999);
        assert_eq!(config.api.host, "0.0.0.0");
        assert!(config.store.journal_enabled);
    }
}

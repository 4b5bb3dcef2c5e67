//! Configuration System
//!
//! Handles loading configuration from TOML files with environment
//! variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("healthtrack")
                .join("healthtrack.db")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./healthtrack.db".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
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

    /// Serve the /export endpoints
    #[serde(default = "default_enable_export")]
    pub enable_export: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

fn default_enable_export() -> bool {
    true
}

impl ApiConfig {
    /// Socket address string for binding
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
            enable_export: default_enable_export(),
        }
    }
}

/// Analytics window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Window used when a request omits `days`
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Window used by trigger detection when a request omits `days`
    #[serde(default = "default_trigger_window_days")]
    pub trigger_window_days: u32,

    /// Largest accepted `days`
    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,
}

fn default_window_days() -> u32 {
    crate::analytics::DEFAULT_WINDOW_DAYS
}

fn default_trigger_window_days() -> u32 {
    crate::analytics::DEFAULT_TRIGGER_WINDOW_DAYS
}

fn default_max_window_days() -> u32 {
    365
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            trigger_window_days: default_trigger_window_days(),
            max_window_days: default_max_window_days(),
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

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
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
        let config_paths = [
            dirs::config_dir().map(|p| p.join("healthtrack").join("config.toml")),
            Some(PathBuf::from("/etc/healthtrack/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("HEALTHTRACK_DATABASE_PATH") {
            self.storage.database_path = path;
        }

        if let Some(host) = var("HEALTHTRACK_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("HEALTHTRACK_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!("Ignoring invalid HEALTHTRACK_API_PORT: {}", port),
            }
        }

        if let Some(level) = var("HEALTHTRACK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("HEALTHTRACK_LOG_FORMAT") {
            self.logging.format = format;
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
    r#"# Healthtrack Configuration
#
# Environment variables override these settings:
# - HEALTHTRACK_DATABASE_PATH
# - HEALTHTRACK_API_HOST
# - HEALTHTRACK_API_PORT
# - HEALTHTRACK_LOG_LEVEL
# - HEALTHTRACK_LOG_FORMAT

[storage]
# SQLite database file
database_path = "~/.local/share/healthtrack/healthtrack.db"

[api]
# API server host
host = "127.0.0.1"

# API server port
port = 8082

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

# Serve the /export endpoints
enable_export = true

[analytics]
# Window (days) used when a request does not pass ?days=
default_window_days = 30

# Window (days) for symptom trigger detection
trigger_window_days = 60

# Largest window a request may ask for
max_window_days = 365

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/healthtrack/healthtrack.log"
"#
    .to_string()
}

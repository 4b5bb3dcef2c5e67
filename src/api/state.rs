//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::analytics::AnalyticsEngine;
use crate::config::Config;
use crate::store::SqliteStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store for CRUD and exports
    pub store: Arc<SqliteStore>,
    /// Analytics over the same store
    pub analytics: AnalyticsEngine,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, config: ApiConfig) -> Self {
        let analytics = AnalyticsEngine::new(store.clone());
        Self {
            store,
            analytics,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Allowed CORS origins, empty for permissive
    pub cors_origins: Vec<String>,
    /// Enable data export endpoints
    pub enable_export: bool,
    /// Analytics window when `days` is omitted
    pub default_window_days: u32,
    /// Trigger window when `days` is omitted
    pub trigger_window_days: u32,
    /// Largest accepted `days`
    pub max_window_days: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ApiConfig {
    fn from(config: &Config) -> Self {
        Self {
            host: config.api.host.clone(),
            port: config.api.port,
            request_timeout_ms: config.api.request_timeout_secs * 1000,
            cors_origins: config.api.cors_origins.clone(),
            enable_export: config.api.enable_export,
            default_window_days: config.analytics.default_window_days,
            trigger_window_days: config.analytics.trigger_window_days,
            max_window_days: config.analytics.max_window_days,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

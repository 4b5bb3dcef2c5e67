//! Healthtrack API Server
//!
//! Run with: cargo run --bin healthtrack
//!
//! # Configuration
//!
//! Settings are read from the first config file found in
//! `~/.config/healthtrack/config.toml`, `/etc/healthtrack/config.toml` or
//! `./config.toml`, then overridden by environment variables:
//! - `HEALTHTRACK_DATABASE_PATH`: SQLite database file
//! - `HEALTHTRACK_API_HOST` / `HEALTHTRACK_API_PORT`: Bind address
//! - `HEALTHTRACK_LOG_LEVEL` / `HEALTHTRACK_LOG_FORMAT`: Logging (`RUST_LOG` wins)

use healthtrack::api::{serve, ApiConfig, AppState};
use healthtrack::config::{Config, LoggingConfig};
use healthtrack::store::SqliteStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_tracing(&config.logging)?;

    tracing::info!("Starting Healthtrack API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.storage.database_path);

    let store = Arc::new(SqliteStore::open(&config.storage.database_path)?);
    tracing::info!(schema_version = store.schema_version()?, "Record store initialized");

    let api_config = ApiConfig::from(&config);
    let state = AppState::new(store, api_config.clone());

    serve(state, &api_config).await?;

    tracing::info!("Healthtrack API server stopped");
    Ok(())
}

/// Install the global subscriber: pretty or JSON, optionally to a file
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "healthtrack={level},tower_http={level}",
            level = logging.level
        ))
    });

    let json = logging.format.eq_ignore_ascii_case("json");

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let writer = Arc::new(file);
            if json {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_ansi(false)
                            .with_writer(writer),
                    )
                    .init();
            }
        }
        None if json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

//! # Healthtrack
//!
//! Personal health tracking API: users record meals, food composition,
//! digestive health logs and sleep logs, and query derived analytics over
//! date ranges.
//!
//! ## Modules
//!
//! - [`store`]: Record types and the SQLite record store
//! - [`analytics`]: Trends, food correlations, sleep statistics and trigger ranking
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthtrack::analytics::AnalyticsEngine;
//! use healthtrack::store::{NewHealthLog, SqliteStore, UserId};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("./healthtrack.db")?);
//!     let user = UserId(1);
//!     let today = chrono::Utc::now().date_naive();
//!
//!     // Record how the day went
//!     store.create_health_log(user, &NewHealthLog::new(today, 4, 3))?;
//!
//!     // Last 7 days of physical feeling
//!     let engine = AnalyticsEngine::new(store);
//!     let trends = engine.health_trends(user, 7, today)?;
//!     println!("Found {} entries", trends.physical_feeling.len());
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    Food, HealthLog, Meal, MealFood, MealType, RangeQuery, RecordStore, SleepLog, SqliteStore,
    StoolQuality, StoreError, StoreResult, UserId,
};

pub use analytics::{
    AnalyticsEngine, DailyCorrelation, HealthField, HealthTrends, SleepAnalysis, TrendPoint,
    TriggerCandidate,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::Config;

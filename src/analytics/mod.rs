//! Healthtrack Analytics
//!
//! Read-only computations over a user's records in a date window:
//!
//! - **trends**: per-field `{date, value}` series of health logs
//! - **correlations**: health logs joined with same-day and previous-day foods
//! - **sleep**: sleep averages with quality and duration series
//! - **triggers**: foods ranked by how often they precede poor days
//!
//! Every operation takes the reference date explicitly, so results only
//! depend on the record set and the arguments.
//!
//! # Example
//!
//! ```rust,no_run
//! use healthtrack::analytics::AnalyticsEngine;
//! use healthtrack::store::{SqliteStore, UserId};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("./healthtrack.db")?);
//!     let engine = AnalyticsEngine::new(store);
//!     let today = chrono::Utc::now().date_naive();
//!
//!     for trigger in engine.symptom_triggers(UserId(1), 60, today)? {
//!         println!("{}: {}", trigger.food, trigger.count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod correlations;
pub mod sleep;
pub mod trends;
pub mod triggers;
pub mod window;

pub use correlations::{DailyCorrelation, FoodPortion};
pub use sleep::SleepAnalysis;
pub use trends::{HealthField, HealthTrends, SleepField, TrendPoint, TrendValue};
pub use triggers::{OccurrenceTally, TriggerCandidate, TOP_TRIGGERS};
pub use window::DateWindow;

use crate::store::{RecordStore, StoreResult, UserId};
use chrono::NaiveDate;
use std::sync::Arc;

/// Default window for trends, correlations and sleep
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Default window for trigger detection
pub const DEFAULT_TRIGGER_WINDOW_DAYS: u32 = 60;

/// Entry point for all analytics over a record store
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn RecordStore>,
}

impl AnalyticsEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Health trends, `days` calendar days ending `today` inclusive
    pub fn health_trends(
        &self,
        user: UserId,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<HealthTrends> {
        trends::health_trends(self.store.as_ref(), user, days, today)
    }

    /// One health field's series
    pub fn health_field_trend(
        &self,
        user: UserId,
        field: HealthField,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<TrendPoint>> {
        trends::health_field_trend(self.store.as_ref(), user, field, days, today)
    }

    /// Health logs with same-day and previous-day foods, `today - days ..= today`
    pub fn food_correlations(
        &self,
        user: UserId,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<DailyCorrelation>> {
        correlations::food_correlations(self.store.as_ref(), user, days, today)
    }

    /// Sleep averages and series, `days` calendar days ending `today` inclusive
    pub fn analyze_sleep(
        &self,
        user: UserId,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<SleepAnalysis> {
        sleep::analyze_sleep(self.store.as_ref(), user, days, today)
    }

    /// Top foods preceding poor days, `today - days ..= today`
    pub fn symptom_triggers(
        &self,
        user: UserId,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<TriggerCandidate>> {
        triggers::symptom_triggers(self.store.as_ref(), user, days, today)
    }
}

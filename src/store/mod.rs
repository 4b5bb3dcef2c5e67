//! Healthtrack Record Store
//!
//! Holds the four record kinds users write and the analytics read:
//!
//! - **types**: Records (HealthLog, SleepLog, Meal, MealFood, Food, Profile) and range queries
//! - **sqlite**: SQLite-backed store with CRUD and range reads
//! - **error**: Error types
//!
//! The analytics engine only depends on the [`RecordStore`] trait, so any
//! store able to answer "records for user U between dates a and b" can be
//! plugged in.
//!
//! # Example
//!
//! ```rust,no_run
//! use healthtrack::store::{NewHealthLog, RangeQuery, RecordStore, SqliteStore, UserId};
//! use chrono::NaiveDate;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open("./healthtrack.db")?;
//!     let user = UserId(1);
//!     let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//!
//!     store.create_health_log(user, &NewHealthLog::new(day, 4, 3))?;
//!
//!     let logs = store.health_logs(user, &RangeQuery::day(day))?;
//!     println!("Found {} logs", logs.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod sqlite;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
pub use types::{
    Food, FoodId, HealthLog, Meal, MealFood, MealId, MealType, MealUpdate, NewFood,
    NewHealthLog, NewMeal, NewMealFood, NewSleepLog, Profile, ProfileUpdate, RangeQuery, RecordId,
    SleepLog, SortOrder, StoolQuality, UserId,
};

use std::collections::HashMap;

/// Read interface the analytics engine consumes
///
/// Range reads are inclusive on both ends, sorted by date in
/// `query.order` and truncated to `query.limit`.
pub trait RecordStore: Send + Sync {
    /// Health logs of `user` dated within the range
    fn health_logs(&self, user: UserId, query: &RangeQuery) -> StoreResult<Vec<HealthLog>>;

    /// Sleep logs of `user` dated within the range
    fn sleep_logs(&self, user: UserId, query: &RangeQuery) -> StoreResult<Vec<SleepLog>>;

    /// Meals of `user` eaten (UTC calendar day) within the range, with composition
    fn meals(&self, user: UserId, query: &RangeQuery) -> StoreResult<Vec<Meal>>;

    /// Composition links grouped by meal
    fn meal_foods(&self, meal_ids: &[MealId]) -> StoreResult<HashMap<MealId, Vec<MealFood>>>;
}

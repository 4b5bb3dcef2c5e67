//! Data Transfer Objects
//!
//! Query parameters and response envelopes for the API endpoints.
//! Record bodies reuse the store's `New*` types directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::HealthField;
use crate::store::{Food, HealthLog, Meal, Profile, SleepLog, UserId};

// ============================================
// QUERY PARAMETERS
// ============================================

/// `?days=` for analytics endpoints
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    #[serde(default)]
    pub days: Option<u32>,
}

/// Parameters for the health trends endpoint
#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    #[serde(default)]
    pub days: Option<u32>,
    /// Restrict the response to one series
    #[serde(default)]
    pub field: Option<HealthField>,
}

/// `?search=` filter on the food list
#[derive(Debug, Default, Deserialize)]
pub struct FoodListParams {
    #[serde(default)]
    pub search: Option<String>,
}

/// `?query=` for food search
#[derive(Debug, Default, Deserialize)]
pub struct FoodSearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// `?format=` for exports
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub format: Option<String>,
}

// ============================================
// EXPORT DTOs
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthExport {
    pub health_logs: Vec<HealthLog>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SleepExport {
    pub sleep_logs: Vec<SleepLog>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MealExport {
    pub meals: Vec<Meal>,
}

/// Everything stored for one user
#[derive(Debug, Serialize, Deserialize)]
pub struct AllDataExport {
    pub user: UserId,
    pub exported_at: DateTime<Utc>,
    pub profile: Profile,
    /// Custom foods owned by the user
    pub foods: Vec<Food>,
    pub meals: Vec<Meal>,
    pub health_logs: Vec<HealthLog>,
    pub sleep_logs: Vec<SleepLog>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Storage status
    pub storage: String,
    /// Applied schema version, if the database answered
    pub schema_version: Option<i32>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Crate version
    pub version: String,
}

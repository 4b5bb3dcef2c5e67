//! Export Routes
//!
//! Per-user data export for backup and analysis.
//!
//! - GET /api/v1/export/health-data?format=json|csv
//! - GET /api/v1/export/sleep-data?format=json|csv
//! - GET /api/v1/export/meal-data
//! - GET /api/v1/export/all-data

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::api::dto::{AllDataExport, ExportParams, HealthExport, MealExport, SleepExport};
use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;

/// Supported export encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    fn parse(raw: Option<&str>) -> ApiResult<Self> {
        match raw.map(str::to_lowercase).as_deref() {
            None | Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            Some(other) => Err(ApiError::Validation(format!(
                "Invalid format: {}. Use json or csv",
                other
            ))),
        }
    }
}

/// GET /api/v1/export/health-data
pub async fn export_health_data(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    ensure_enabled(&state)?;
    let format = ExportFormat::parse(params.format.as_deref())?;

    let mut health_logs = state.store.list_health_logs(user)?;
    health_logs.reverse();

    tracing::info!(user_id = %user, records = health_logs.len(), ?format, "Exporting health data");

    match format {
        ExportFormat::Json => Ok(Json(HealthExport { health_logs }).into_response()),
        ExportFormat::Csv => csv_response("health_data", &health_logs),
    }
}

/// GET /api/v1/export/sleep-data
pub async fn export_sleep_data(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    ensure_enabled(&state)?;
    let format = ExportFormat::parse(params.format.as_deref())?;

    let mut sleep_logs = state.store.list_sleep_logs(user)?;
    sleep_logs.reverse();

    tracing::info!(user_id = %user, records = sleep_logs.len(), ?format, "Exporting sleep data");

    match format {
        ExportFormat::Json => Ok(Json(SleepExport { sleep_logs }).into_response()),
        ExportFormat::Csv => csv_response("sleep_data", &sleep_logs),
    }
}

/// GET /api/v1/export/meal-data
pub async fn export_meal_data(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MealExport>> {
    ensure_enabled(&state)?;

    let mut meals = state.store.list_meals(user)?;
    meals.reverse();

    tracing::info!(user_id = %user, records = meals.len(), "Exporting meal data");

    Ok(Json(MealExport { meals }))
}

/// GET /api/v1/export/all-data
pub async fn export_all_data(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<AllDataExport>> {
    ensure_enabled(&state)?;

    let profile = state.store.get_or_create_profile(user)?;
    let foods = state
        .store
        .list_foods(user, None)?
        .into_iter()
        .filter(|f| f.owner == Some(user))
        .collect();

    let mut meals = state.store.list_meals(user)?;
    let mut health_logs = state.store.list_health_logs(user)?;
    let mut sleep_logs = state.store.list_sleep_logs(user)?;
    meals.reverse();
    health_logs.reverse();
    sleep_logs.reverse();

    tracing::info!(user_id = %user, "Exporting all data");

    Ok(Json(AllDataExport {
        user,
        exported_at: Utc::now(),
        profile,
        foods,
        meals,
        health_logs,
        sleep_logs,
    }))
}

fn ensure_enabled(state: &AppState) -> ApiResult<()> {
    if !state.config.enable_export {
        return Err(ApiError::Validation(
            "Export feature is disabled".to_string(),
        ));
    }
    Ok(())
}

/// Encode flat records as CSV with a header row
fn to_csv<T: Serialize>(records: &[T]) -> ApiResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| ApiError::Internal(format!("CSV encoding failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV encoding failed: {}", e)))
}

fn csv_response<T: Serialize>(name: &str, records: &[T]) -> ApiResult<Response> {
    let body = to_csv(records)?;
    let filename = format!("healthtrack_{}_{}.csv", name, Utc::now().format("%Y%m%d_%H%M%S"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{HealthLog, StoolQuality, UserId};
    use chrono::NaiveDate;

    #[test]
    fn test_parse_format() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::parse(Some("CSV")).unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::parse(Some("xml")).is_err());
    }

    #[test]
    fn test_health_logs_to_csv() {
        let log = HealthLog {
            id: 1,
            user: UserId(7),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            physical_feeling: 2,
            mental_feeling: 4,
            stool_count: 1,
            stool_quality: Some(StoolQuality::Soft),
            complete_evacuation: None,
            weight: Some(71.2),
            symptoms: "bloating, cramps".to_string(),
            notes: String::new(),
        };

        let csv = String::from_utf8(to_csv(&[log]).unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,user,date,physical_feeling,mental_feeling,stool_count,stool_quality,\
             complete_evacuation,weight,symptoms,notes"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,7,2024-03-01,2,4,1,soft,,71.2,\"bloating, cramps\","
        );
    }
}

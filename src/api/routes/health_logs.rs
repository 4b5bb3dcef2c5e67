//! Health Log Routes
//!
//! - GET /api/v1/health-logs - List the caller's logs, newest first
//! - POST /api/v1/health-logs - Create a log (409 if the date is taken)
//! - GET /api/v1/health-logs/daily[/:date] - The log of one day (404 if none)
//! - GET /api/v1/health-logs/weekly[/:date] - Logs of `date ..= date + 6`
//! - GET /api/v1/health-logs/monthly[/:date] - Logs from `date` (default the
//!   first of this month) to the end of that month
//! - GET/PUT/DELETE /api/v1/health-logs/:id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::routes::{
    date_or, first_of_month, rest_of_month, today, validate_non_negative, validate_score,
    week_from,
};
use crate::api::state::AppState;
use crate::store::{HealthLog, NewHealthLog, RecordId, RecordStore};

/// GET /api/v1/health-logs
pub async fn list_health_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<HealthLog>>> {
    Ok(Json(state.store.list_health_logs(user)?))
}

/// GET /api/v1/health-logs/daily[/:date]
pub async fn daily_health_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    date: Option<Path<String>>,
) -> ApiResult<Json<HealthLog>> {
    let date = date_or(date.map(|Path(d)| d), today())?;
    state
        .store
        .health_log_on(user, date)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No health log found for this date".to_string()))
}

/// GET /api/v1/health-logs/weekly[/:date]
pub async fn weekly_health_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    date: Option<Path<String>>,
) -> ApiResult<Json<Vec<HealthLog>>> {
    let start = date_or(date.map(|Path(d)| d), today())?;
    Ok(Json(state.store.health_logs(user, &week_from(start))?))
}

/// GET /api/v1/health-logs/monthly[/:date]
pub async fn monthly_health_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    date: Option<Path<String>>,
) -> ApiResult<Json<Vec<HealthLog>>> {
    let start = date_or(date.map(|Path(d)| d), first_of_month(today()))?;
    Ok(Json(state.store.health_logs(user, &rest_of_month(start))?))
}

/// GET /api/v1/health-logs/:id
pub async fn get_health_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<HealthLog>> {
    state
        .store
        .get_health_log(user, id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Health log with id {} not found", id)))
}

/// POST /api/v1/health-logs
pub async fn create_health_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewHealthLog>,
) -> ApiResult<(StatusCode, Json<HealthLog>)> {
    validate_health_log(&req)?;

    let log = state.store.create_health_log(user, &req)?;
    tracing::info!(user_id = %user, date = %log.date, "Created health log");

    Ok((StatusCode::CREATED, Json(log)))
}

/// PUT /api/v1/health-logs/:id
pub async fn update_health_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecordId>,
    Json(req): Json<NewHealthLog>,
) -> ApiResult<Json<HealthLog>> {
    validate_health_log(&req)?;
    Ok(Json(state.store.update_health_log(user, id, &req)?))
}

/// DELETE /api/v1/health-logs/:id
pub async fn delete_health_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    state.store.delete_health_log(user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_health_log(req: &NewHealthLog) -> ApiResult<()> {
    validate_score("physical_feeling", req.physical_feeling)?;
    validate_score("mental_feeling", req.mental_feeling)?;
    validate_non_negative("weight", req.weight)?;
    Ok(())
}

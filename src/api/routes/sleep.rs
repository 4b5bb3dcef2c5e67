//! Sleep Routes
//!
//! - GET /api/v1/sleep - List the caller's sleep logs, newest first
//! - POST /api/v1/sleep - Create a sleep log (409 if the date is taken)
//! - GET /api/v1/sleep/weekly[/:date] - Logs of `date ..= date + 6`
//! - GET /api/v1/sleep/monthly[/:date] - Logs to the end of the month
//! - GET/PUT/DELETE /api/v1/sleep/:id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::routes::{
    date_or, first_of_month, rest_of_month, today, validate_positive, validate_score, week_from,
};
use crate::api::state::AppState;
use crate::store::{NewSleepLog, RecordId, RecordStore, SleepLog};

/// Longest plausible sleep, in hours
const MAX_DURATION_HOURS: f64 = 24.0;

/// GET /api/v1/sleep
pub async fn list_sleep_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<SleepLog>>> {
    Ok(Json(state.store.list_sleep_logs(user)?))
}

/// GET /api/v1/sleep/weekly[/:date]
pub async fn weekly_sleep_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    date: Option<Path<String>>,
) -> ApiResult<Json<Vec<SleepLog>>> {
    let start = date_or(date.map(|Path(d)| d), today())?;
    Ok(Json(state.store.sleep_logs(user, &week_from(start))?))
}

/// GET /api/v1/sleep/monthly[/:date]
pub async fn monthly_sleep_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    date: Option<Path<String>>,
) -> ApiResult<Json<Vec<SleepLog>>> {
    let start = date_or(date.map(|Path(d)| d), first_of_month(today()))?;
    Ok(Json(state.store.sleep_logs(user, &rest_of_month(start))?))
}

/// GET /api/v1/sleep/:id
pub async fn get_sleep_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<SleepLog>> {
    state
        .store
        .get_sleep_log(user, id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Sleep log with id {} not found", id)))
}

/// POST /api/v1/sleep
pub async fn create_sleep_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewSleepLog>,
) -> ApiResult<(StatusCode, Json<SleepLog>)> {
    validate_sleep_log(&req)?;

    let log = state.store.create_sleep_log(user, &req)?;
    tracing::info!(user_id = %user, date = %log.date, duration = log.duration, "Created sleep log");

    Ok((StatusCode::CREATED, Json(log)))
}

/// PUT /api/v1/sleep/:id
pub async fn update_sleep_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecordId>,
    Json(req): Json<NewSleepLog>,
) -> ApiResult<Json<SleepLog>> {
    validate_sleep_log(&req)?;
    Ok(Json(state.store.update_sleep_log(user, id, &req)?))
}

/// DELETE /api/v1/sleep/:id
pub async fn delete_sleep_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    state.store.delete_sleep_log(user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_sleep_log(req: &NewSleepLog) -> ApiResult<()> {
    validate_positive("duration", req.duration)?;
    if req.duration > MAX_DURATION_HOURS {
        return Err(ApiError::Validation(format!(
            "duration must not exceed {} hours",
            MAX_DURATION_HOURS
        )));
    }
    validate_score("quality", req.quality)?;
    validate_score("wake_up_ease", req.wake_up_ease)?;
    validate_score("energy_level", req.energy_level)?;
    Ok(())
}

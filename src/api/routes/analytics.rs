//! Analytics Routes
//!
//! - GET /api/v1/analytics/health-trends?days=&field= - Health trend series
//! - GET /api/v1/analytics/food-correlations?days= - Health logs with nearby foods
//! - GET /api/v1/analytics/sleep-analysis?days= - Sleep averages and series
//! - GET /api/v1/analytics/symptom-triggers?days= - Foods preceding poor days

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::analytics::{DailyCorrelation, HealthTrends, SleepAnalysis, TrendPoint, TriggerCandidate};
use crate::api::dto::{TrendParams, WindowParams};
use crate::api::error::ApiResult;
use crate::api::identity::CurrentUser;
use crate::api::routes::{resolve_days, today};
use crate::api::state::AppState;

/// Either every health series or the one requested with `?field=`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TrendsResponse {
    All(HealthTrends),
    Field(Vec<TrendPoint>),
}

/// GET /api/v1/analytics/health-trends
pub async fn health_trends(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<TrendParams>,
) -> ApiResult<Json<TrendsResponse>> {
    let days = window_days(&state, params.days)?;

    let response = match params.field {
        Some(field) => TrendsResponse::Field(
            state
                .analytics
                .health_field_trend(user, field, days, today())?,
        ),
        None => TrendsResponse::All(state.analytics.health_trends(user, days, today())?),
    };

    Ok(Json(response))
}

/// GET /api/v1/analytics/food-correlations
pub async fn food_correlations(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<Vec<DailyCorrelation>>> {
    let days = window_days(&state, params.days)?;
    Ok(Json(state.analytics.food_correlations(user, days, today())?))
}

/// GET /api/v1/analytics/sleep-analysis
pub async fn sleep_analysis(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<SleepAnalysis>> {
    let days = window_days(&state, params.days)?;
    Ok(Json(state.analytics.analyze_sleep(user, days, today())?))
}

/// GET /api/v1/analytics/symptom-triggers
pub async fn symptom_triggers(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<Vec<TriggerCandidate>>> {
    let days = resolve_days(
        params.days,
        state.config.trigger_window_days,
        state.config.max_window_days,
    )?;
    Ok(Json(state.analytics.symptom_triggers(user, days, today())?))
}

fn window_days(state: &AppState, requested: Option<u32>) -> ApiResult<u32> {
    resolve_days(
        requested,
        state.config.default_window_days,
        state.config.max_window_days,
    )
}

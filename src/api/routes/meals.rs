//! Meal Routes
//!
//! - GET /api/v1/meals - List the caller's meals, newest first
//! - POST /api/v1/meals - Create a meal with its foods
//! - GET /api/v1/meals/daily[/:date] - Meals of one day, ascending
//! - GET /api/v1/meals/weekly[/:date] - Meals of `date ..= date + 6`, ascending
//! - GET /api/v1/meals/:id - Get a meal
//! - PUT /api/v1/meals/:id - Update a meal, replacing foods when given
//! - DELETE /api/v1/meals/:id - Delete a meal

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::routes::{date_or, today, validate_positive, week_from};
use crate::api::state::AppState;
use crate::store::{Meal, MealId, MealUpdate, NewMeal, NewMealFood, RangeQuery, RecordStore};

/// GET /api/v1/meals
pub async fn list_meals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Meal>>> {
    Ok(Json(state.store.list_meals(user)?))
}

/// GET /api/v1/meals/daily[/:date]
pub async fn daily_meals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    date: Option<Path<String>>,
) -> ApiResult<Json<Vec<Meal>>> {
    let date = date_or(date.map(|Path(d)| d), today())?;
    Ok(Json(state.store.meals(user, &RangeQuery::day(date))?))
}

/// GET /api/v1/meals/weekly[/:date]
pub async fn weekly_meals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    date: Option<Path<String>>,
) -> ApiResult<Json<Vec<Meal>>> {
    let start = date_or(date.map(|Path(d)| d), today())?;
    let meals = state.store.meals(user, &week_from(start))?;

    tracing::debug!(user_id = %user, start = %start, meals = meals.len(), "Weekly meals");

    Ok(Json(meals))
}

/// GET /api/v1/meals/:id
pub async fn get_meal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<MealId>,
) -> ApiResult<Json<Meal>> {
    state
        .store
        .get_meal(user, id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Meal with id {} not found", id)))
}

/// POST /api/v1/meals
pub async fn create_meal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewMeal>,
) -> ApiResult<(StatusCode, Json<Meal>)> {
    validate_foods(&req.foods)?;

    let meal = state.store.create_meal(user, &req)?;
    tracing::info!(
        user_id = %user,
        meal_id = meal.id,
        foods = meal.foods.len(),
        "Created meal"
    );

    Ok((StatusCode::CREATED, Json(meal)))
}

/// PUT /api/v1/meals/:id
pub async fn update_meal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<MealId>,
    Json(req): Json<MealUpdate>,
) -> ApiResult<Json<Meal>> {
    if let Some(foods) = &req.foods {
        validate_foods(foods)?;
    }
    Ok(Json(state.store.update_meal(user, id, &req)?))
}

/// DELETE /api/v1/meals/:id
pub async fn delete_meal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<MealId>,
) -> ApiResult<StatusCode> {
    state.store.delete_meal(user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_foods(foods: &[NewMealFood]) -> ApiResult<()> {
    foods
        .iter()
        .try_for_each(|f| validate_positive("amount", f.amount))
}

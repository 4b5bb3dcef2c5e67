//! Food Routes
//!
//! - GET /api/v1/foods - List foods visible to the caller (`?search=`)
//! - POST /api/v1/foods - Create a food owned by the caller
//! - GET /api/v1/foods/search?query= - Name search
//! - GET /api/v1/foods/:id - Get a food
//! - PUT /api/v1/foods/:id - Replace a food (owner only)
//! - DELETE /api/v1/foods/:id - Delete a food (owner only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FoodListParams, FoodSearchParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::routes::validate_non_negative;
use crate::api::state::AppState;
use crate::store::{Food, FoodId, NewFood};

const MAX_NAME_LEN: usize = 100;

/// GET /api/v1/foods
pub async fn list_foods(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<FoodListParams>,
) -> ApiResult<Json<Vec<Food>>> {
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    Ok(Json(state.store.list_foods(user, search)?))
}

/// GET /api/v1/foods/search?query=
pub async fn search_foods(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<FoodSearchParams>,
) -> ApiResult<Json<Vec<Food>>> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("Query parameter is required".to_string()))?;

    Ok(Json(state.store.list_foods(user, Some(query))?))
}

/// GET /api/v1/foods/:id
pub async fn get_food(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<FoodId>,
) -> ApiResult<Json<Food>> {
    state
        .store
        .get_food(user, id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Food with id {} not found", id)))
}

/// POST /api/v1/foods
pub async fn create_food(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewFood>,
) -> ApiResult<(StatusCode, Json<Food>)> {
    validate_food(&req)?;

    let food = state.store.create_food(user, &req)?;
    tracing::info!(user_id = %user, food_id = food.id, name = %food.name, "Created food");

    Ok((StatusCode::CREATED, Json(food)))
}

/// PUT /api/v1/foods/:id
pub async fn update_food(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<FoodId>,
    Json(req): Json<NewFood>,
) -> ApiResult<Json<Food>> {
    validate_food(&req)?;
    Ok(Json(state.store.update_food(user, id, &req)?))
}

/// DELETE /api/v1/foods/:id
pub async fn delete_food(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<FoodId>,
) -> ApiResult<StatusCode> {
    state.store.delete_food(user, id)?;
    tracing::info!(user_id = %user, food_id = id, "Deleted food");
    Ok(StatusCode::NO_CONTENT)
}

/// Validate a food body
fn validate_food(req: &NewFood) -> ApiResult<()> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Food name cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "Food name exceeds maximum length of {} characters",
            MAX_NAME_LEN
        )));
    }
    if matches!(req.calories, Some(c) if c < 0) {
        return Err(ApiError::Validation("calories must not be negative".to_string()));
    }
    validate_non_negative("protein", req.protein)?;
    validate_non_negative("carbs", req.carbs)?;
    validate_non_negative("fats", req.fats)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_food() {
        let valid = NewFood::new("Oats").macros(13.0, 67.0, 7.0);
        assert!(validate_food(&valid).is_ok());

        assert!(validate_food(&NewFood::new("  ")).is_err());
        assert!(validate_food(&NewFood::new("x".repeat(101))).is_err());

        let negative = NewFood {
            fats: Some(-0.5),
            ..valid.clone()
        };
        assert!(validate_food(&negative).is_err());

        let negative = NewFood {
            calories: Some(-10),
            ..valid
        };
        assert!(validate_food(&negative).is_err());
    }
}

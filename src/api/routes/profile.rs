//! Profile Routes
//!
//! - GET /api/v1/profile - The caller's profile, created empty on first access
//! - PUT /api/v1/profile - Update profile fields; omitted fields are kept

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::store::{Profile, ProfileUpdate};

/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.store.get_or_create_profile(user)?))
}

/// PUT /api/v1/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    let profile = state.store.update_profile(user, &req)?;
    tracing::info!(user_id = %user, "Updated profile");
    Ok(Json(profile))
}

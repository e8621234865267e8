//! Profile endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{Profile, UpdateProfile},
    AppState,
};

use super::AuthenticatedUser;

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "No profile for this user")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Profile>> {
    let profile = state.services.profiles.get(&user.id).await?;
    Ok(Json(profile))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/profile",
    tag = "profile",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 400, description = "Invalid username")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(data): Json<UpdateProfile>,
) -> AppResult<Json<Profile>> {
    let profile = state.services.profiles.update(&user.id, &data).await?;
    Ok(Json(profile))
}

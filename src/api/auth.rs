//! Authentication endpoints

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_stream::{Stream, StreamExt};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        session::{SignInRequest, SignUpRequest},
        SessionUser,
    },
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct SignUpResponse {
    pub user: SessionUser,
    /// False when the account still has to be confirmed by email
    pub signed_in: bool,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

/// Create an account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = SignUpResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 401, description = "Rejected by the identity provider")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<SignUpResponse>)> {
    let outcome = state.services.auth.sign_up(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user: outcome.user,
            signed_in: outcome.session.is_some(),
        }),
    ))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> AppResult<Json<LoginResponse>> {
    let session = state.services.auth.sign_in(&request).await?;
    Ok(Json(LoginResponse {
        user: session.user,
        expires_at: session.expires_at,
    }))
}

/// Sign out
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Signed out")
    )
)]
pub async fn sign_out(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.services.auth.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = SessionUser),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<SessionUser> {
    Json(user)
}

/// Current user, then every session change, as server-sent events
#[utoipa::path(
    get,
    path = "/auth/session/stream",
    tag = "auth",
    responses(
        (status = 200, description = "Stream of `session` events carrying the user or null", body = String, content_type = "text/event-stream")
    )
)]
pub async fn session_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = state
        .session
        .users()
        .map(|user| Event::default().event("session").json_data(user));
    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

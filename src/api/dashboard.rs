//! Page endpoints behind the route guard
//!
//! Pages answer with the JSON their view renders. Protected pages never run
//! without a user: the guard redirects to the login page first.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{user_book::rating_stars, Profile, SessionUser, UserBookWithBook},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize)]
pub struct PageResponse {
    pub page: String,
    pub user: Option<SessionUser>,
}

/// Library entry as shown on a dashboard page
#[derive(Serialize)]
pub struct DashboardEntry {
    #[serde(flatten)]
    pub entry: UserBookWithBook,
    /// Note rendered as stars
    pub stars: String,
}

impl From<UserBookWithBook> for DashboardEntry {
    fn from(entry: UserBookWithBook) -> Self {
        let stars = rating_stars(entry.relation.note);
        Self { entry, stars }
    }
}

fn entries(rows: Vec<UserBookWithBook>) -> Json<Vec<DashboardEntry>> {
    Json(rows.into_iter().map(DashboardEntry::from).collect())
}

pub async fn index(State(state): State<AppState>) -> Json<PageResponse> {
    Json(PageResponse {
        page: "home".to_string(),
        user: state.session.current_user(),
    })
}

pub async fn login(State(state): State<AppState>) -> Json<PageResponse> {
    Json(PageResponse {
        page: "login".to_string(),
        user: state.session.current_user(),
    })
}

pub async fn library(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<DashboardEntry>>> {
    let rows = state.services.library.books(&user.id).await?;
    Ok(entries(rows))
}

pub async fn favorites(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<DashboardEntry>>> {
    let rows = state.services.library.favorites(&user.id).await?;
    Ok(entries(rows))
}

pub async fn wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<DashboardEntry>>> {
    let rows = state.services.library.wishlist(&user.id).await?;
    Ok(entries(rows))
}

pub async fn settings(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Profile>> {
    let profile = state.services.profiles.get(&user.id).await?;
    Ok(Json(profile))
}

//! Endpoints for the current user's own library

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{user_book::AddUserBook, UpdateUserBook, UserBook, UserBookWithBook},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct ExistsResponse {
    pub book_id: String,
    pub exists: bool,
}

/// Every book in the current user's library, newest first
#[utoipa::path(
    get,
    path = "/me/books",
    tag = "library",
    responses(
        (status = 200, description = "Library entries with their books", body = Vec<UserBookWithBook>),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_my_books(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<UserBookWithBook>>> {
    let entries = state.services.library.books(&user.id).await?;
    Ok(Json(entries))
}

/// Add a book to the current user's library
#[utoipa::path(
    post,
    path = "/me/books",
    tag = "library",
    request_body = AddUserBook,
    responses(
        (status = 201, description = "Book added", body = UserBook),
        (status = 400, description = "Invalid input"),
        (status = 502, description = "Book already in the library")
    )
)]
pub async fn add_my_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(data): Json<AddUserBook>,
) -> AppResult<(StatusCode, Json<UserBook>)> {
    let entry = state.services.library.add(&user.id, &data).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Favorite books of the current user
#[utoipa::path(
    get,
    path = "/me/books/favorites",
    tag = "library",
    responses(
        (status = 200, description = "Favorite entries", body = Vec<UserBookWithBook>)
    )
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<UserBookWithBook>>> {
    let entries = state.services.library.favorites(&user.id).await?;
    Ok(Json(entries))
}

/// Wishlisted books of the current user
#[utoipa::path(
    get,
    path = "/me/books/wishlist",
    tag = "library",
    responses(
        (status = 200, description = "Wishlist entries", body = Vec<UserBookWithBook>)
    )
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<UserBookWithBook>>> {
    let entries = state.services.library.wishlist(&user.id).await?;
    Ok(Json(entries))
}

/// The current user's entry for a book
#[utoipa::path(
    get,
    path = "/me/books/{book_id}",
    tag = "library",
    params(("book_id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Library entry", body = UserBook),
        (status = 404, description = "Book not in the library")
    )
)]
pub async fn get_my_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(book_id): Path<String>,
) -> AppResult<Json<UserBook>> {
    let entry = state
        .services
        .library
        .get(&user.id, &book_id)
        .await?
        .found_or(|| AppError::NotFound(format!("Book {} is not in your library", book_id)))?;
    Ok(Json(entry))
}

/// Flip the favorite flag, adding the book to the library when needed
#[utoipa::path(
    post,
    path = "/me/books/{book_id}/favorite",
    tag = "library",
    params(("book_id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Entry after the toggle", body = UserBook)
    )
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(book_id): Path<String>,
) -> AppResult<Json<UserBook>> {
    let entry = state.services.library.toggle_favorite(&user.id, &book_id).await?;
    Ok(Json(entry))
}

/// Whether the book is in the current user's library
#[utoipa::path(
    get,
    path = "/me/books/{book_id}/exists",
    tag = "library",
    params(("book_id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Membership", body = ExistsResponse)
    )
)]
pub async fn has_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(book_id): Path<String>,
) -> AppResult<Json<ExistsResponse>> {
    let exists = state.services.library.has_book(&user.id, &book_id).await?;
    Ok(Json(ExistsResponse { book_id, exists }))
}

/// Update a library entry
#[utoipa::path(
    put,
    path = "/user-books/{id}",
    tag = "library",
    params(("id" = String, Path, description = "Library entry ID")),
    request_body = UpdateUserBook,
    responses(
        (status = 200, description = "Entry updated", body = UserBook),
        (status = 400, description = "Note out of range"),
        (status = 404, description = "No such entry in the current user's library")
    )
)]
pub async fn update_user_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateUserBook>,
) -> AppResult<Json<UserBook>> {
    let entry = state.services.library.update(&user.id, &id, &data).await?;
    Ok(Json(entry))
}

/// Remove a library entry
#[utoipa::path(
    delete,
    path = "/user-books/{id}",
    tag = "library",
    params(("id" = String, Path, description = "Library entry ID")),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 404, description = "No such entry in the current user's library")
    )
)]
pub async fn delete_user_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.library.remove(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookMatchQuery, BookSearchQuery, CreateBook, UpdateBook},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct OwnershipResponse {
    pub book_id: String,
    /// Whether the current user catalogued the book
    pub associated: bool,
}

/// List all books, newest first
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list().await?;
    Ok(Json(books))
}

/// Search books by title or author
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(
        ("q" = String, Query, description = "At least 2 characters; shorter queries return nothing")
    ),
    responses(
        (status = 200, description = "Up to 10 matching books", body = Vec<Book>)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search(&query.q).await?;
    Ok(Json(books))
}

/// Find the book with exactly this title and author, ignoring case
#[utoipa::path(
    get,
    path = "/books/match",
    tag = "books",
    params(
        ("title" = String, Query, description = "Exact title"),
        ("author" = Option<String>, Query, description = "Exact author; omit to match books without one")
    ),
    responses(
        (status = 200, description = "Matching book", body = Book),
        (status = 404, description = "No match")
    )
)]
pub async fn match_book(
    State(state): State<AppState>,
    Query(query): Query<BookMatchQuery>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .catalog
        .find_exact_match(&query.title, query.author.as_deref())
        .await?
        .found_or(|| AppError::NotFound("No book with this title and author".to_string()))?;
    Ok(Json(book))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get(&id).await?;
    Ok(Json(book))
}

/// Create a book, catalogued by the current user unless stated otherwise
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(mut data): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    if data.created_by.is_none() {
        data.created_by = Some(user.id);
    }
    let book = state.services.catalog.create(&data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.update(&id, &data).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Whether the current user catalogued the book
#[utoipa::path(
    get,
    path = "/books/{id}/owner",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Ownership", body = OwnershipResponse)
    )
)]
pub async fn get_owner(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<OwnershipResponse>> {
    let associated = state.services.catalog.is_catalogued_by(&id, &user.id).await?;
    Ok(Json(OwnershipResponse {
        book_id: id,
        associated,
    }))
}

/// Record the current user as the book's cataloguer
#[utoipa::path(
    put,
    path = "/books/{id}/owner",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book associated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn claim_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.claim(&id, &user.id).await?;
    Ok(Json(book))
}

/// Clear the current user as the book's cataloguer
#[utoipa::path(
    delete,
    path = "/books/{id}/owner",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book disassociated", body = Book),
        (status = 404, description = "Book not catalogued by the current user")
    )
)]
pub async fn release_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.release(&id, &user.id).await?;
    Ok(Json(book))
}

/// Books catalogued by a user
#[utoipa::path(
    get,
    path = "/users/{id}/books",
    tag = "books",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Catalogued books", body = Vec<Book>)
    )
)]
pub async fn list_catalogued_books(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.catalogued_by(&user_id).await?;
    Ok(Json(books))
}

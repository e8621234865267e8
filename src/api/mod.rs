//! HTTP surface: JSON API under `/api/v1` and the guarded dashboard pages

pub mod auth;
pub mod books;
pub mod dashboard;
pub mod health;
pub mod library;
pub mod openapi;
pub mod profile;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, guard, models::SessionUser, AppState};

/// Extractor for the signed-in user of the process-wide session
pub struct AuthenticatedUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.services.auth.current_user().map(AuthenticatedUser)
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/login", post(auth::sign_in))
        .route("/auth/logout", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
        .route("/auth/session/stream", get(auth::session_stream))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/search", get(books::search_books))
        .route("/books/match", get(books::match_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route(
            "/books/:id/owner",
            get(books::get_owner).put(books::claim_book).delete(books::release_book),
        )
        .route("/users/:id/books", get(books::list_catalogued_books))
        // Own library
        .route("/me/books", get(library::list_my_books).post(library::add_my_book))
        .route("/me/books/favorites", get(library::list_favorites))
        .route("/me/books/wishlist", get(library::list_wishlist))
        .route("/me/books/:book_id", get(library::get_my_book))
        .route("/me/books/:book_id/favorite", post(library::toggle_favorite))
        .route("/me/books/:book_id/exists", get(library::has_book))
        .route(
            "/user-books/:id",
            put(library::update_user_book).delete(library::delete_user_book),
        )
        // Profile
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .with_state(state.clone());

    let pages = Router::new()
        .route("/", get(dashboard::index))
        .route("/login", get(dashboard::login))
        .route("/dashboard/library", get(dashboard::library))
        .route("/dashboard/favorites", get(dashboard::favorites))
        .route("/dashboard/wishlist", get(dashboard::wishlist))
        .route("/dashboard/settings", get(dashboard::settings))
        .layer(middleware::from_fn_with_state(state.clone(), guard::route_guard))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(pages)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

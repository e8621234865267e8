//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, library, profile};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "0.3.0",
        description = "Personal book tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::sign_up,
        auth::sign_in,
        auth::sign_out,
        auth::me,
        auth::session_stream,
        // Books
        books::list_books,
        books::search_books,
        books::match_book,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::get_owner,
        books::claim_book,
        books::release_book,
        books::list_catalogued_books,
        // Library
        library::list_my_books,
        library::add_my_book,
        library::list_favorites,
        library::list_wishlist,
        library::get_my_book,
        library::toggle_favorite,
        library::has_book,
        library::update_user_book,
        library::delete_user_book,
        // Profile
        profile::get_profile,
        profile::update_profile,
    ),
    components(
        schemas(
            // Auth
            auth::SignUpResponse,
            auth::LoginResponse,
            crate::models::session::SignUpRequest,
            crate::models::session::SignInRequest,
            crate::models::session::SessionUser,
            crate::models::session::UserMetadata,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::OwnershipResponse,
            // Library
            crate::models::user_book::UserBook,
            crate::models::user_book::UserBookWithBook,
            crate::models::user_book::AddUserBook,
            crate::models::user_book::UpdateUserBook,
            library::ExistsResponse,
            // Profile
            crate::models::profile::Profile,
            crate::models::profile::UpdateProfile,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Accounts and the current session"),
        (name = "books", description = "Shared book catalog"),
        (name = "library", description = "The current user's own books"),
        (name = "profile", description = "The current user's profile")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

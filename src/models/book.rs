//! Book model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

/// Book record as stored in the `books` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    /// Identifier assigned by the data service
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    #[serde(default)]
    pub genre: String,
    /// When the reader started the book (free-form date or marker)
    #[serde(default)]
    pub started: String,
    pub rating: Option<String>,
    /// Review text
    pub critic: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
    /// User who catalogued the book
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Reduced book projection attached to relation rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    #[serde(default)]
    pub genre: String,
    pub created_at: DateTime<Utc>,
}

impl BookSummary {
    /// Columns selected when embedding a book into a relation row
    pub const COLUMNS: &'static [&'static str] = &["id", "title", "author", "genre", "created_at"];
}

/// Create book request
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub started: String,
    pub rating: Option<String>,
    pub critic: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    pub created_by: Option<String>,
}

/// Partial book update; absent fields are left untouched
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub started: Option<String>,
    pub rating: Option<String>,
    pub critic: Option<String>,
    pub favorite: Option<bool>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.started.is_none()
            && self.rating.is_none()
            && self.critic.is_none()
            && self.favorite.is_none()
    }
}

/// Search query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookSearchQuery {
    /// Text matched against title and author
    pub q: String,
}

/// Exact-match query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookMatchQuery {
    pub title: String,
    /// Absent or blank matches books without an author
    pub author: Option<String>,
}

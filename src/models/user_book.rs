//! User-book relation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use super::book::BookSummary;

/// Rating value marking a book as wanted but not yet rated
pub const WISHLIST_NOTE: i16 = 0;

/// Per-user state for one book (`user_books` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserBook {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    #[serde(default)]
    pub favorite: bool,
    /// Rating from 1 to 5, or 0 for the wishlist
    pub note: Option<i16>,
    pub review: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl UserBook {
    pub fn is_wishlisted(&self) -> bool {
        self.note == Some(WISHLIST_NOTE)
    }
}

/// Relation row with its book embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserBookWithBook {
    #[serde(flatten)]
    pub relation: UserBook,
    /// Embedded book; absent when the book was deleted underneath the relation
    pub books: Option<BookSummary>,
}

/// Create relation request
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserBook {
    pub user_id: String,
    pub book_id: String,
    #[serde(default)]
    pub favorite: bool,
    pub note: Option<i16>,
    pub review: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

/// Body accepted by the API when the current user adds a book
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddUserBook {
    pub book_id: String,
    #[serde(default)]
    pub favorite: bool,
    pub note: Option<i16>,
    pub review: Option<String>,
}

/// Partial relation update
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserBook {
    pub favorite: Option<bool>,
    pub note: Option<i16>,
    pub review: Option<String>,
}

impl UpdateUserBook {
    pub fn is_empty(&self) -> bool {
        self.favorite.is_none() && self.note.is_none() && self.review.is_none()
    }
}

/// Render a relation note as stars.
///
/// No note renders nothing, the wishlist note renders a single star,
/// ratings render one star each (at most five).
pub fn rating_stars(note: Option<i16>) -> String {
    match note {
        None => String::new(),
        Some(n) if n <= WISHLIST_NOTE => "⭐️".to_string(),
        Some(n) => "⭐️".repeat(n.min(5) as usize),
    }
}

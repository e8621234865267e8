//! Library service: a user's own relations to books

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        user_book::{AddUserBook, CreateUserBook, UpdateUserBook, UserBook, UserBookWithBook},
        Lookup,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LibraryService {
    repository: Repository,
}

impl LibraryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn books(&self, user_id: &str) -> AppResult<Vec<UserBookWithBook>> {
        self.repository.user_books.fetch_user_books_with_details(user_id).await
    }

    pub async fn favorites(&self, user_id: &str) -> AppResult<Vec<UserBookWithBook>> {
        self.repository.user_books.fetch_favorite_books(user_id).await
    }

    pub async fn wishlist(&self, user_id: &str) -> AppResult<Vec<UserBookWithBook>> {
        self.repository.user_books.fetch_wishlist_books(user_id).await
    }

    /// Add a book to the user's library
    pub async fn add(&self, user_id: &str, data: &AddUserBook) -> AppResult<UserBook> {
        if let Some(note) = data.note {
            validate_note(note)?;
        }
        let relation = CreateUserBook {
            user_id: user_id.to_string(),
            book_id: data.book_id.clone(),
            favorite: data.favorite,
            note: data.note,
            review: data.review.clone(),
            added_at: Some(Utc::now()),
        };
        self.repository.user_books.add_user_book(&relation).await
    }

    pub async fn get(&self, user_id: &str, book_id: &str) -> AppResult<Lookup<UserBook>> {
        self.repository.user_books.fetch_user_book(user_id, book_id).await
    }

    pub async fn has_book(&self, user_id: &str, book_id: &str) -> AppResult<bool> {
        self.repository.books.check_user_has_book(user_id, book_id).await
    }

    pub async fn toggle_favorite(&self, user_id: &str, book_id: &str) -> AppResult<UserBook> {
        self.repository.user_books.toggle_favorite(user_id, book_id).await
    }

    pub async fn update(&self, user_id: &str, id: &str, data: &UpdateUserBook) -> AppResult<UserBook> {
        if let Some(note) = data.note {
            validate_note(note)?;
        }
        self.repository.user_books.update_user_book(user_id, id, data).await
    }

    pub async fn remove(&self, user_id: &str, id: &str) -> AppResult<()> {
        self.repository.user_books.delete_user_book(user_id, id).await
    }
}

/// Notes go from 0 (wishlist) to 5 stars
fn validate_note(note: i16) -> AppResult<()> {
    if !(0..=5).contains(&note) {
        return Err(AppError::Validation(format!(
            "Note must be between 0 and 5, got {}",
            note
        )));
    }
    Ok(())
}

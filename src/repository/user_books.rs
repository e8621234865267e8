//! User-book relations repository

use std::sync::Arc;

use serde_json::json;

use super::{decode, decode_rows, fetch_lookup, first_row};
use crate::{
    datasource::{DataSource, Query},
    error::{require_id, AppError, AppResult},
    models::{
        book::BookSummary,
        user_book::{CreateUserBook, UpdateUserBook, UserBook, UserBookWithBook, WISHLIST_NOTE},
        Lookup,
    },
};

const TABLE: &str = "user_books";
const BOOKS_TABLE: &str = "books";
const TOGGLE_FAVORITE_FN: &str = "toggle_favorite";

#[derive(Clone)]
pub struct UserBooksRepository {
    source: Arc<dyn DataSource>,
}

impl UserBooksRepository {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Relations of a user with their book attached, newest first
    fn with_details(user_id: &str) -> Query {
        Query::table(TABLE)
            .embed(BOOKS_TABLE, "book_id", BookSummary::COLUMNS)
            .eq("user_id", user_id)
            .order_desc("added_at")
    }

    pub async fn add_user_book(&self, data: &CreateUserBook) -> AppResult<UserBook> {
        require_id("User ID", &data.user_id)?;
        require_id("Book ID", &data.book_id)?;

        let row = serde_json::to_value(data)?;
        let rows = self
            .source
            .insert(TABLE, &row)
            .await
            .map_err(|e| e.context("adding user book"))?;
        first_row(rows, "adding user book")
    }

    pub async fn fetch_user_books_with_details(&self, user_id: &str) -> AppResult<Vec<UserBookWithBook>> {
        let user_id = require_id("User ID", user_id)?;
        let rows = self
            .source
            .select(&Self::with_details(user_id))
            .await
            .map_err(|e| e.context("fetching user books"))?;
        decode_rows(rows, "fetching user books")
    }

    pub async fn fetch_user_book(&self, user_id: &str, book_id: &str) -> AppResult<Lookup<UserBook>> {
        let user_id = require_id("User ID", user_id)?;
        let book_id = require_id("Book ID", book_id)?;
        let query = Query::table(TABLE)
            .eq("user_id", user_id)
            .eq("book_id", book_id);
        fetch_lookup(self.source.as_ref(), &query, "fetching user book").await
    }

    /// Update one of the user's relations; relations of other users are not found
    pub async fn update_user_book(
        &self,
        user_id: &str,
        id: &str,
        updates: &UpdateUserBook,
    ) -> AppResult<UserBook> {
        let user_id = require_id("User ID", user_id)?;
        let id = require_id("Relation ID", id)?;
        if updates.is_empty() {
            return Err(AppError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }

        let changes = serde_json::to_value(updates)?;
        let rows = self
            .source
            .update(&Query::table(TABLE).eq("id", id).eq("user_id", user_id), &changes)
            .await
            .map_err(|e| e.context("updating user book"))?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("User book {} not found", id)));
        }
        first_row(rows, "updating user book")
    }

    /// Delete one of the user's relations; relations of other users are not found
    pub async fn delete_user_book(&self, user_id: &str, id: &str) -> AppResult<()> {
        let user_id = require_id("User ID", user_id)?;
        let id = require_id("Relation ID", id)?;
        let deleted = self
            .source
            .delete(&Query::table(TABLE).eq("id", id).eq("user_id", user_id))
            .await
            .map_err(|e| e.context("deleting user book"))?;
        if deleted.is_empty() {
            return Err(AppError::NotFound(format!("User book {} not found", id)));
        }
        Ok(())
    }

    /// Flip the favorite flag, creating the relation as a favorite if missing.
    ///
    /// Runs as one conditional upsert on the data service, so concurrent
    /// toggles for the same pair never create a second relation.
    pub async fn toggle_favorite(&self, user_id: &str, book_id: &str) -> AppResult<UserBook> {
        let user_id = require_id("User ID", user_id)?;
        let book_id = require_id("Book ID", book_id)?;

        let row = self
            .source
            .rpc(
                TOGGLE_FAVORITE_FN,
                &json!({ "p_user_id": user_id, "p_book_id": book_id }),
            )
            .await
            .map_err(|e| e.context("toggling favorite"))?;
        let relation: UserBook = decode(row, "toggling favorite")?;
        tracing::debug!(user_id, book_id, favorite = relation.favorite, "Favorite toggled");
        Ok(relation)
    }

    pub async fn fetch_favorite_books(&self, user_id: &str) -> AppResult<Vec<UserBookWithBook>> {
        let user_id = require_id("User ID", user_id)?;
        let rows = self
            .source
            .select(&Self::with_details(user_id).eq("favorite", true))
            .await
            .map_err(|e| e.context("fetching favorites"))?;
        decode_rows(rows, "fetching favorites")
    }

    /// Relations still waiting for a rating
    pub async fn fetch_wishlist_books(&self, user_id: &str) -> AppResult<Vec<UserBookWithBook>> {
        let user_id = require_id("User ID", user_id)?;
        let rows = self
            .source
            .select(&Self::with_details(user_id).eq("note", WISHLIST_NOTE))
            .await
            .map_err(|e| e.context("fetching wishlist"))?;
        decode_rows(rows, "fetching wishlist")
    }
}

//! Books repository

use std::sync::Arc;

use serde::de::IgnoredAny;
use serde_json::{json, Value};
use validator::Validate;

use super::{decode_rows, fetch_lookup, first_row};
use crate::{
    datasource::{escape_like, DataSource, Filter, Query},
    error::{require_id, AppError, AppResult},
    models::{
        book::{Book, CreateBook, UpdateBook},
        Lookup,
    },
};

const TABLE: &str = "books";
const RELATION_TABLE: &str = "user_books";

/// Searches shorter than this return nothing without querying
pub const SEARCH_MIN_CHARS: usize = 2;
/// Maximum number of search results
pub const SEARCH_LIMIT: usize = 10;

#[derive(Clone)]
pub struct BooksRepository {
    source: Arc<dyn DataSource>,
}

impl BooksRepository {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// All books, newest first
    pub async fn fetch_books(&self) -> AppResult<Vec<Book>> {
        let query = Query::table(TABLE).order_desc("created_at");
        let rows = self
            .source
            .select(&query)
            .await
            .map_err(|e| e.context("fetching books"))?;
        decode_rows(rows, "fetching books")
    }

    /// Get book by ID
    pub async fn fetch_book_by_id(&self, id: &str) -> AppResult<Lookup<Book>> {
        let id = require_id("Book ID", id)?;
        let query = Query::table(TABLE).eq("id", id);
        fetch_lookup(self.source.as_ref(), &query, "fetching book").await
    }

    /// Case-insensitive substring search on title or author
    pub async fn search_books(&self, search: &str) -> AppResult<Vec<Book>> {
        let term = search.trim();
        if term.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(term));
        let query = Query::table(TABLE)
            .or(vec![
                Filter::ilike("title", &pattern),
                Filter::ilike("author", &pattern),
            ])
            .order_desc("created_at")
            .limit(SEARCH_LIMIT);
        let mut rows = self
            .source
            .select(&query)
            .await
            .map_err(|e| e.context("searching books"))?;
        rows.truncate(SEARCH_LIMIT);
        decode_rows(rows, "searching books")
    }

    /// Book whose title and author both match, ignoring case.
    /// A missing or blank author matches books that have none.
    pub async fn find_exact_match(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> AppResult<Lookup<Book>> {
        let title = require_id("Title", title)?;
        let author = author.and_then(non_blank);

        let query = Query::table(TABLE).ilike("title", &escape_like(title));
        let query = match author {
            Some(author) => query.ilike("author", &escape_like(author)),
            None => query.or(vec![Filter::is_null("author"), Filter::eq("author", "")]),
        };
        let rows = self
            .source
            .select(&query.order_desc("created_at"))
            .await
            .map_err(|e| e.context("matching book"))?;
        let books: Vec<Book> = decode_rows(rows, "matching book")?;

        // the pattern can over-match (`*` is sent as `_`)
        let title = title.to_lowercase();
        let author = author.map(str::to_lowercase);
        let book = books.into_iter().find(|book| {
            book.title.trim().to_lowercase() == title
                && book.author.as_deref().and_then(non_blank).map(str::to_lowercase) == author
        });
        Ok(book.into())
    }

    /// Create a book; the id is assigned by the data service
    pub async fn add_book(&self, data: &CreateBook) -> AppResult<Book> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let row = serde_json::to_value(data)?;
        let rows = self
            .source
            .insert(TABLE, &row)
            .await
            .map_err(|e| e.context("adding book"))?;
        let book: Book = first_row(rows, "adding book")?;
        tracing::info!(book_id = %book.id, "Book added");
        Ok(book)
    }

    /// Partial update
    pub async fn update_book(&self, id: &str, updates: &UpdateBook) -> AppResult<Book> {
        let id = require_id("Book ID", id)?;
        if updates.is_empty() {
            return Err(AppError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }

        let changes = serde_json::to_value(updates)?;
        self.update_one(id, Query::table(TABLE).eq("id", id), &changes, "updating book")
            .await
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        let id = require_id("Book ID", id)?;
        self.source
            .delete(&Query::table(TABLE).eq("id", id))
            .await
            .map_err(|e| e.context("deleting book"))?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }

    /// Books catalogued by a user (`created_by`), newest first
    pub async fn fetch_user_books(&self, user_id: &str) -> AppResult<Vec<Book>> {
        let user_id = require_id("User ID", user_id)?;
        let query = Query::table(TABLE)
            .eq("created_by", user_id)
            .order_desc("created_at");
        let rows = self
            .source
            .select(&query)
            .await
            .map_err(|e| e.context("fetching user catalogue"))?;
        decode_rows(rows, "fetching user catalogue")
    }

    /// Whether the book is catalogued by the user
    pub async fn is_book_associated(&self, book_id: &str, user_id: &str) -> AppResult<bool> {
        let book_id = require_id("Book ID", book_id)?;
        let user_id = require_id("User ID", user_id)?;
        let query = Query::table(TABLE)
            .columns(&["id"])
            .eq("id", book_id)
            .eq("created_by", user_id)
            .limit(1);
        let rows = self
            .source
            .select(&query)
            .await
            .map_err(|e| e.context("checking book owner"))?;
        Ok(!rows.is_empty())
    }

    /// Record the user as the book's cataloguer
    pub async fn associate_book(&self, book_id: &str, user_id: &str) -> AppResult<Book> {
        let book_id = require_id("Book ID", book_id)?;
        let user_id = require_id("User ID", user_id)?;
        self.update_one(
            book_id,
            Query::table(TABLE).eq("id", book_id),
            &json!({ "created_by": user_id }),
            "associating book",
        )
        .await
    }

    /// Clear the cataloguer, only if it is this user
    pub async fn disassociate_book(&self, book_id: &str, user_id: &str) -> AppResult<Book> {
        let book_id = require_id("Book ID", book_id)?;
        let user_id = require_id("User ID", user_id)?;
        self.update_one(
            book_id,
            Query::table(TABLE).eq("id", book_id).eq("created_by", user_id),
            &json!({ "created_by": Value::Null }),
            "disassociating book",
        )
        .await
    }

    /// Whether the user has a relation row for the book
    pub async fn check_user_has_book(&self, user_id: &str, book_id: &str) -> AppResult<bool> {
        let user_id = require_id("User ID", user_id)?;
        let book_id = require_id("Book ID", book_id)?;
        let query = Query::table(RELATION_TABLE)
            .columns(&["id"])
            .eq("user_id", user_id)
            .eq("book_id", book_id);
        let found: Lookup<IgnoredAny> =
            fetch_lookup(self.source.as_ref(), &query, "checking user book").await?;
        Ok(found.is_found())
    }

    async fn update_one(
        &self,
        id: &str,
        target: Query,
        changes: &Value,
        action: &str,
    ) -> AppResult<Book> {
        let rows = self
            .source
            .update(&target, changes)
            .await
            .map_err(|e| e.context(action))?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        first_row(rows, action)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

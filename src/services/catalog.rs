//! Catalog service: the shared `books` table

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, UpdateBook},
        Lookup,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.fetch_books().await
    }

    pub async fn get(&self, id: &str) -> AppResult<Book> {
        self.repository
            .books
            .fetch_book_by_id(id)
            .await?
            .found_or(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<Book>> {
        self.repository.books.search_books(query).await
    }

    pub async fn find_exact_match(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> AppResult<Lookup<Book>> {
        self.repository.books.find_exact_match(title, author).await
    }

    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        self.repository.books.add_book(data).await
    }

    pub async fn update(&self, id: &str, data: &UpdateBook) -> AppResult<Book> {
        self.repository.books.update_book(id, data).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.repository.books.delete_book(id).await
    }

    /// Books catalogued by a user
    pub async fn catalogued_by(&self, user_id: &str) -> AppResult<Vec<Book>> {
        self.repository.books.fetch_user_books(user_id).await
    }

    pub async fn is_catalogued_by(&self, book_id: &str, user_id: &str) -> AppResult<bool> {
        self.repository.books.is_book_associated(book_id, user_id).await
    }

    pub async fn claim(&self, book_id: &str, user_id: &str) -> AppResult<Book> {
        self.repository.books.associate_book(book_id, user_id).await
    }

    pub async fn release(&self, book_id: &str, user_id: &str) -> AppResult<Book> {
        self.repository.books.disassociate_book(book_id, user_id).await
    }
}

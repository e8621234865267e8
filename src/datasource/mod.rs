//! Access to the hosted relational store
//!
//! Repositories describe what they want with a [`Query`] and hand it to a
//! [`DataSource`]. [`postgrest::PostgrestClient`] talks to the hosted REST
//! interface; [`memory::MemoryDataSource`] keeps tables in process.

pub mod memory;
pub mod postgrest;
mod query;

pub use query::{escape_like, like_matches, Embed, Filter, Order, Query};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;

/// Table-scoped CRUD against the external store.
///
/// Rows travel as JSON objects. A single-row select that matches no row
/// fails with a remote error carrying [`crate::error::NO_ROWS_CODE`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Rows matching the query
    async fn select(&self, query: &Query) -> AppResult<Vec<Value>>;

    /// Exactly one row matching the query
    async fn select_single(&self, query: &Query) -> AppResult<Value>;

    /// Insert a row and return what the store persisted
    async fn insert(&self, table: &str, row: &Value) -> AppResult<Vec<Value>>;

    /// Apply `changes` to every row matched by the query's filters
    async fn update(&self, query: &Query, changes: &Value) -> AppResult<Vec<Value>>;

    /// Delete every row matched by the query's filters and return them
    async fn delete(&self, query: &Query) -> AppResult<Vec<Value>>;

    /// Call a stored function
    async fn rpc(&self, function: &str, args: &Value) -> AppResult<Value>;
}

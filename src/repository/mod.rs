//! Repository layer over the hosted data service

pub mod books;
pub mod profiles;
pub mod user_books;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    datasource::{DataSource, Query},
    error::{AppError, AppResult},
    models::Lookup,
};

/// Main repository struct holding the data source
#[derive(Clone)]
pub struct Repository {
    pub source: Arc<dyn DataSource>,
    pub books: books::BooksRepository,
    pub user_books: user_books::UserBooksRepository,
    pub profiles: profiles::ProfilesRepository,
}

impl Repository {
    /// Create a new repository with the given data source
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            books: books::BooksRepository::new(source.clone()),
            user_books: user_books::UserBooksRepository::new(source.clone()),
            profiles: profiles::ProfilesRepository::new(source.clone()),
            source,
        }
    }
}

fn decode<T: DeserializeOwned>(row: Value, action: &str) -> AppResult<T> {
    serde_json::from_value(row).map_err(|e| AppError::from(e).context(action))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, action: &str) -> AppResult<Vec<T>> {
    rows.into_iter().map(|row| decode(row, action)).collect()
}

/// First returned row, or a remote failure when the service returned nothing
fn first_row<T: DeserializeOwned>(rows: Vec<Value>, action: &str) -> AppResult<T> {
    match rows.into_iter().next() {
        Some(row) => decode(row, action),
        None => Err(AppError::remote(None, "No data returned by the service").context(action)),
    }
}

/// Single-row select where zero rows is a valid outcome
async fn fetch_lookup<T: DeserializeOwned>(
    source: &dyn DataSource,
    query: &Query,
    action: &str,
) -> AppResult<Lookup<T>> {
    match source.select_single(query).await {
        Ok(row) => decode(row, action).map(Lookup::Found),
        Err(e) if e.is_no_rows() => Ok(Lookup::NotFound),
        Err(e) => Err(e.context(action)),
    }
}

//! In-process data source
//!
//! Mirrors the hosted schema closely enough for tests and offline runs:
//! generated ids, column defaults, the `(user_id, book_id)` uniqueness of
//! relations and the `toggle_favorite` stored function.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{like_matches, DataSource, Filter, Query};
use crate::error::{AppError, AppResult, NO_ROWS_CODE};

const UNIQUE_VIOLATION: &str = "23505";
const UNKNOWN_FUNCTION: &str = "PGRST202";

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Map<String, Value>>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps so insertion order is also time order
    fn next_timestamp(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn table(&mut self, name: &str) -> &mut Vec<Map<String, Value>> {
        self.rows.entry(name.to_string()).or_default()
    }

    fn insert(&mut self, table: &str, row: &Value) -> AppResult<Map<String, Value>> {
        let mut row = match row {
            Value::Object(map) => map.clone(),
            _ => return Err(AppError::remote(Some("PGRST102".into()), "Row must be a JSON object")),
        };
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        self.apply_defaults(table, &mut row);

        if table == "user_books" {
            let duplicate = self.table(table).iter().any(|existing| {
                existing.get("user_id") == row.get("user_id")
                    && existing.get("book_id") == row.get("book_id")
            });
            if duplicate {
                return Err(AppError::remote(
                    Some(UNIQUE_VIOLATION.into()),
                    "duplicate key value violates unique constraint \"user_books_user_book_key\"",
                ));
            }
        }
        if self.table(table).iter().any(|existing| existing.get("id") == row.get("id")) {
            return Err(AppError::remote(
                Some(UNIQUE_VIOLATION.into()),
                format!("duplicate key value violates unique constraint \"{}_pkey\"", table),
            ));
        }

        self.table(table).push(row.clone());
        Ok(row)
    }

    fn apply_defaults(&mut self, table: &str, row: &mut Map<String, Value>) {
        let defaults: Vec<(&str, Value)> = match table {
            "books" => vec![
                ("created_at", Value::String(self.next_timestamp())),
                ("favorite", Value::Bool(false)),
                ("genre", Value::String(String::new())),
                ("started", Value::String(String::new())),
                ("author", Value::Null),
                ("rating", Value::Null),
                ("critic", Value::Null),
                ("created_by", Value::Null),
            ],
            "user_books" => vec![
                ("added_at", Value::String(self.next_timestamp())),
                ("favorite", Value::Bool(false)),
                ("note", Value::Null),
                ("review", Value::Null),
            ],
            "profiles" => vec![("username", Value::Null), ("is_premium", Value::Bool(false))],
            _ => Vec::new(),
        };
        for (column, value) in defaults {
            row.entry(column).or_insert(value);
        }
    }

    fn matching(&self, query: &Query) -> Vec<Map<String, Value>> {
        let Some(rows) = self.rows.get(&query.table) else {
            return Vec::new();
        };
        let mut matched: Vec<Map<String, Value>> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| filter_matches(f, row)))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        matched
    }

    fn project(&self, query: &Query, row: Map<String, Value>) -> Value {
        let mut out = if query.columns.is_empty() {
            row.clone()
        } else {
            query
                .columns
                .iter()
                .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                .collect()
        };

        if let Some(embed) = &query.embed {
            let foreign = row.get(&embed.foreign_key).and_then(|key| {
                self.rows
                    .get(&embed.table)
                    .and_then(|rows| rows.iter().find(|r| r.get("id") == Some(key)))
            });
            let embedded = match foreign {
                Some(foreign) => Value::Object(
                    embed
                        .columns
                        .iter()
                        .map(|c| (c.clone(), foreign.get(c).cloned().unwrap_or(Value::Null)))
                        .collect(),
                ),
                None => Value::Null,
            };
            out.insert(embed.table.clone(), embedded);
        }
        Value::Object(out)
    }

    fn toggle_favorite(&mut self, args: &Value) -> AppResult<Value> {
        let user_id = args.get("p_user_id").cloned().unwrap_or(Value::Null);
        let book_id = args.get("p_book_id").cloned().unwrap_or(Value::Null);

        let existing = self.table("user_books").iter_mut().find(|row| {
            row.get("user_id") == Some(&user_id) && row.get("book_id") == Some(&book_id)
        });
        if let Some(row) = existing {
            let favorite = row.get("favorite").and_then(Value::as_bool).unwrap_or(false);
            row.insert("favorite".to_string(), Value::Bool(!favorite));
            return Ok(Value::Object(row.clone()));
        }

        let row = json!({ "user_id": user_id, "book_id": book_id, "favorite": true });
        self.insert("user_books", &row).map(Value::Object)
    }
}

fn filter_matches(filter: &Filter, row: &Map<String, Value>) -> bool {
    match filter {
        Filter::Eq(column, value) => row.get(column).unwrap_or(&Value::Null) == value,
        Filter::ILike(column, pattern) => row
            .get(column)
            .and_then(Value::as_str)
            .map(|text| like_matches(pattern, text))
            .unwrap_or(false),
        Filter::IsNull(column) => row.get(column).map_or(true, Value::is_null),
        Filter::Or(filters) => filters.iter().any(|f| filter_matches(f, row)),
    }
}

/// Postgres-like ordering: nulls sort after every value
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Tables kept in process memory
#[derive(Default)]
pub struct MemoryDataSource {
    tables: Mutex<Tables>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("In-memory tables lock poisoned".to_string()))
    }

    /// Number of rows currently stored in a table
    pub fn row_count(&self, table: &str) -> usize {
        self.lock()
            .map(|tables| tables.rows.get(table).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn select(&self, query: &Query) -> AppResult<Vec<Value>> {
        let tables = self.lock()?;
        Ok(tables
            .matching(query)
            .into_iter()
            .map(|row| tables.project(query, row))
            .collect())
    }

    async fn select_single(&self, query: &Query) -> AppResult<Value> {
        let tables = self.lock()?;
        let mut rows = tables.matching(query);
        if rows.len() != 1 {
            return Err(AppError::remote(
                Some(NO_ROWS_CODE.into()),
                format!(
                    "JSON object requested, multiple (or no) rows returned ({} rows)",
                    rows.len()
                ),
            ));
        }
        let row = rows.remove(0);
        Ok(tables.project(query, row))
    }

    async fn insert(&self, table: &str, row: &Value) -> AppResult<Vec<Value>> {
        let mut tables = self.lock()?;
        let inserted = tables.insert(table, row)?;
        Ok(vec![Value::Object(inserted)])
    }

    async fn update(&self, query: &Query, changes: &Value) -> AppResult<Vec<Value>> {
        let Value::Object(changes) = changes else {
            return Err(AppError::remote(Some("PGRST102".into()), "Changes must be a JSON object"));
        };
        let mut tables = self.lock()?;
        let mut updated = Vec::new();
        for row in tables.table(&query.table).iter_mut() {
            if query.filters.iter().all(|f| filter_matches(f, row)) {
                for (column, value) in changes {
                    row.insert(column.clone(), value.clone());
                }
                updated.push(Value::Object(row.clone()));
            }
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> AppResult<Vec<Value>> {
        let mut tables = self.lock()?;
        let (deleted, kept): (Vec<_>, Vec<_>) = std::mem::take(tables.table(&query.table))
            .into_iter()
            .partition(|row| query.filters.iter().all(|f| filter_matches(f, row)));
        *tables.table(&query.table) = kept;
        Ok(deleted.into_iter().map(Value::Object).collect())
    }

    async fn rpc(&self, function: &str, args: &Value) -> AppResult<Value> {
        let mut tables = self.lock()?;
        match function {
            "toggle_favorite" => tables.toggle_favorite(args),
            other => Err(AppError::remote(
                Some(UNKNOWN_FUNCTION.into()),
                format!("Could not find the function public.{}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_id_and_defaults() {
        let source = MemoryDataSource::new();
        let rows = source
            .insert("books", &json!({ "title": "Dune" }))
            .await
            .unwrap();
        let row = &rows[0];
        assert!(row["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(row["favorite"], json!(false));
        assert!(row["created_at"].is_string());
        assert_eq!(source.row_count("books"), 1);
    }

    #[tokio::test]
    async fn test_select_single_reports_no_rows() {
        let source = MemoryDataSource::new();
        let err = source
            .select_single(&Query::table("books").eq("id", "missing"))
            .await
            .unwrap_err();
        assert!(err.is_no_rows());
    }

    #[tokio::test]
    async fn test_order_limit_and_or_filter() {
        let source = MemoryDataSource::new();
        for title in ["Dune", "Hyperion", "Dune Messiah", "Foundation"] {
            source.insert("books", &json!({ "title": title })).await.unwrap();
        }
        let query = Query::table("books")
            .or(vec![Filter::ilike("title", "%dune%"), Filter::ilike("author", "%dune%")])
            .order_desc("created_at")
            .limit(1);
        let rows = source.select(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Dune Messiah");
    }

    #[tokio::test]
    async fn test_relation_uniqueness() {
        let source = MemoryDataSource::new();
        let relation = json!({ "user_id": "u-1", "book_id": "b-1" });
        source.insert("user_books", &relation).await.unwrap();
        let err = source.insert("user_books", &relation).await.unwrap_err();
        assert!(matches!(err, AppError::Remote { code: Some(ref c), .. } if c == UNIQUE_VIOLATION));
    }

    #[tokio::test]
    async fn test_embed_projects_foreign_columns() {
        let source = MemoryDataSource::new();
        let book = source
            .insert("books", &json!({ "title": "Dune", "critic": "long" }))
            .await
            .unwrap()
            .remove(0);
        source
            .insert("user_books", &json!({ "user_id": "u-1", "book_id": book["id"] }))
            .await
            .unwrap();

        let query = Query::table("user_books").embed("books", "book_id", &["id", "title"]);
        let rows = source.select(&query).await.unwrap();
        assert_eq!(rows[0]["books"], json!({ "id": book["id"], "title": "Dune" }));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let source = MemoryDataSource::new();
        let err = source.rpc("nope", &json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::Remote { code: Some(ref c), .. } if c == UNKNOWN_FUNCTION));
    }
}

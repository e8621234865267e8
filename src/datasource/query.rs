//! Table-scoped query description and its PostgREST encoding

use serde_json::Value;

/// Row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// Case-insensitive LIKE with `%`/`_` wildcards
    ILike(String, String),
    /// `column IS NULL`
    IsNull(String),
    /// Any of the nested filters matches
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn ilike(column: &str, pattern: &str) -> Self {
        Filter::ILike(column.to_string(), pattern.to_string())
    }

    pub fn is_null(column: &str) -> Self {
        Filter::IsNull(column.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Rows of a foreign table attached to each result row under the table's name
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub table: String,
    /// Column of the queried table holding the foreign row's id
    pub foreign_key: String,
    pub columns: Vec<String>,
}

/// A select/update/delete target: one table plus filters, ordering and limit
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// Selected columns; empty selects every column
    pub columns: Vec<String>,
    pub embed: Option<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            embed: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn embed(mut self, table: &str, foreign_key: &str, columns: &[&str]) -> Self {
        self.embed = Some(Embed {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters.push(Filter::ilike(column, pattern));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::is_null(column));
        self
    }

    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::Or(filters));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `select` parameter value, e.g. `*,books(id,title)`
    pub fn select_clause(&self) -> String {
        let mut clause = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        if let Some(embed) = &self.embed {
            clause.push_str(&format!(",{}({})", embed.table, embed.columns.join(",")));
        }
        clause
    }

    /// Query-string pairs for the filters only (update/delete targets)
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|filter| match filter {
                Filter::Eq(column, value) => (column.clone(), format!("eq.{}", plain_value(value))),
                Filter::ILike(column, pattern) => (column.clone(), format!("ilike.{}", pattern)),
                Filter::IsNull(column) => (column.clone(), "is.null".to_string()),
                Filter::Or(filters) => {
                    let inner: Vec<String> = filters.iter().map(nested_condition).collect();
                    ("or".to_string(), format!("({})", inner.join(",")))
                }
            })
            .collect()
    }

    /// Full query-string pairs for a select
    pub fn select_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_clause())];
        params.extend(self.filter_params());
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Condition inside an `or=(...)` list, quoting values that contain reserved characters
fn nested_condition(filter: &Filter) -> String {
    match filter {
        Filter::Eq(column, value) => format!("{}.eq.{}", column, quote_reserved(&plain_value(value))),
        Filter::ILike(column, pattern) => format!("{}.ilike.{}", column, quote_reserved(pattern)),
        Filter::IsNull(column) => format!("{}.is.null", column),
        Filter::Or(filters) => {
            let inner: Vec<String> = filters.iter().map(nested_condition).collect();
            format!("or({})", inner.join(","))
        }
    }
}

fn quote_reserved(value: &str) -> String {
    if value.contains([',', '.', ':', '(', ')', '"', '\\']) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

/// Escape LIKE metacharacters so user input matches literally.
///
/// The REST interface rewrites every `*` of a like pattern to `%`, escaped or
/// not, so `*` becomes the one-character wildcard `_`. A pattern built from
/// input containing `*` can therefore over-match; callers needing an exact
/// match compare the returned rows themselves.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Case-insensitive LIKE match: `%` any run, `_` one char, `\` escapes the next char
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();
    like_at(&pattern, &text)
}

fn like_at(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('%') => (0..=text.len()).any(|skip| like_at(&pattern[1..], &text[skip..])),
        Some('_') => !text.is_empty() && like_at(&pattern[1..], &text[1..]),
        Some('\\') if pattern.len() > 1 => {
            text.first() == Some(&pattern[1]) && like_at(&pattern[2..], &text[1..])
        }
        Some(c) => text.first() == Some(c) && like_at(&pattern[1..], &text[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_select_params() {
        let query = Query::table("user_books")
            .embed("books", "book_id", &["id", "title"])
            .eq("user_id", "u-1")
            .eq("favorite", true)
            .eq("note", 0)
            .order_desc("added_at")
            .limit(5);
        let params = query.select_params();

        assert_eq!(param(&params, "select"), Some("*,books(id,title)"));
        assert_eq!(param(&params, "user_id"), Some("eq.u-1"));
        assert_eq!(param(&params, "favorite"), Some("eq.true"));
        assert_eq!(param(&params, "note"), Some("eq.0"));
        assert_eq!(param(&params, "order"), Some("added_at.desc"));
        assert_eq!(param(&params, "limit"), Some("5"));
    }

    #[test]
    fn test_or_filter_quotes_reserved_characters() {
        let query = Query::table("books").or(vec![
            Filter::ilike("title", "%dune%"),
            Filter::ilike("author", "%herbert, f.%"),
        ]);
        let params = query.filter_params();
        assert_eq!(
            param(&params, "or"),
            Some(r#"(title.ilike.%dune%,author.ilike."%herbert, f.%")"#)
        );
    }

    #[test]
    fn test_columns_clause() {
        let query = Query::table("books").columns(&["id"]);
        assert_eq!(query.select_clause(), "id");
        assert_eq!(plain_value(&json!(null)), "null");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("Dune"), "Dune");
    }

    #[test]
    fn test_star_never_reaches_the_pattern() {
        let query = Query::table("books").ilike("title", &escape_like("M*A*S*H"));
        assert_eq!(
            query.filter_params(),
            vec![("title".to_string(), "ilike.M_A_S_H".to_string())]
        );
        assert!(like_matches(&escape_like("M*A*S*H"), "m*a*s*h"));
        assert!(!like_matches(&escape_like("M*A*S*H"), "M*A*S*H 2"));
    }

    #[test]
    fn test_is_null_encoding() {
        let query = Query::table("books").ilike("title", "dune").is_null("author");
        assert_eq!(param(&query.filter_params(), "author"), Some("is.null"));

        let query = Query::table("books").or(vec![Filter::is_null("author"), Filter::eq("author", "")]);
        assert_eq!(param(&query.filter_params(), "or"), Some("(author.is.null,author.eq.)"));
    }

    #[test]
    fn test_like_matches() {
        assert!(like_matches("%dune%", "Children of DUNE"));
        assert!(like_matches("dune", "Dune"));
        assert!(!like_matches("dune", "Dune Messiah"));
        assert!(like_matches("d_ne", "dune"));
        assert!(like_matches(&format!("%{}%", escape_like("100%")), "a 100% read"));
        assert!(!like_matches(&format!("%{}%", escape_like("100%")), "a 1000 read"));
    }
}

// ABOUTME: Parameterized WHERE clause builder for catalog list endpoints
// ABOUTME: Collects conditions and typed bind values in matching order

use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;

enum FilterValue {
    Text(String),
    Real(f64),
}

/// Conditions joined with `AND`, each with `?` placeholders bound in order
#[derive(Default)]
pub struct Filters {
    conditions: Vec<String>,
    values: Vec<FilterValue>,
}

impl Filters {
    /// Start with no conditions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition without parameters
    pub fn push(&mut self, condition: &str) {
        self.conditions.push(condition.to_owned());
    }

    /// Add a condition with one text parameter
    pub fn push_text(&mut self, condition: &str, value: impl Into<String>) {
        self.conditions.push(condition.to_owned());
        self.values.push(FilterValue::Text(value.into()));
    }

    /// Add a condition with one real parameter
    pub fn push_real(&mut self, condition: &str, value: f64) {
        self.conditions.push(condition.to_owned());
        self.values.push(FilterValue::Real(value));
    }

    /// Case-insensitive substring match over several columns; blank terms are ignored
    pub fn push_search(&mut self, columns: &[&str], term: Option<&str>) {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return;
        };
        let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        let clause = columns
            .iter()
            .map(|c| format!("{c} LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.conditions.push(format!("({clause})"));
        for _ in columns {
            self.values.push(FilterValue::Text(pattern.clone()));
        }
    }

    /// Rows strictly older than `(timestamp, id)` for newest-first keyset pagination
    pub fn push_before(&mut self, timestamp_column: &str, id_column: &str, timestamp: String, id: String) {
        self.conditions.push(format!(
            "({timestamp_column} < ? OR ({timestamp_column} = ? AND {id_column} < ?))"
        ));
        self.values.push(FilterValue::Text(timestamp.clone()));
        self.values.push(FilterValue::Text(timestamp));
        self.values.push(FilterValue::Text(id));
    }

    /// `WHERE ...` or an empty string
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Bind the collected values onto a query
    #[must_use]
    pub fn bind<'q>(
        &self,
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for value in &self.values {
            query = match value {
                FilterValue::Text(v) => query.bind(v.clone()),
                FilterValue::Real(v) => query.bind(*v),
            };
        }
        query
    }

    /// Bind the collected values onto a typed query such as a `COUNT(*)`
    #[must_use]
    pub fn bind_as<'q, O>(
        &self,
        mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        for value in &self.values {
            query = match value {
                FilterValue::Text(v) => query.bind(v.clone()),
                FilterValue::Real(v) => query.bind(*v),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause() {
        let mut filters = Filters::new();
        assert_eq!(filters.where_clause(), "");
        filters.push("is_published = 1");
        filters.push_text("category = ?", "lunch");
        filters.push_search(&["title", "description"], Some("  50%  "));
        filters.push_search(&["title"], Some("  "));
        assert_eq!(
            filters.where_clause(),
            "WHERE is_published = 1 AND category = ? AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')"
        );
        assert_eq!(filters.values.len(), 3);
    }

    #[test]
    fn test_push_before_binds_three_values() {
        let mut filters = Filters::new();
        filters.push_before("taken_at", "id", "2025-01-01T00:00:00.000Z".into(), "abc".into());
        assert_eq!(
            filters.where_clause(),
            "WHERE (taken_at < ? OR (taken_at = ? AND id < ?))"
        );
        assert_eq!(filters.values.len(), 3);
    }
}

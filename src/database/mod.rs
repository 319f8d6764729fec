//! Query execution for the football reporting database
//!
//! This module provides the query layer the dashboards sit on:
//! - `QueryExecutor`: run parameterized SQL and get JSON rows back
//! - `CachedExecutor`: keyed result cache with a time-to-live
//! - `ReportQuery`: the catalog of named analytical queries
//! - `run_select`: ad-hoc read-only queries
//! - PostgreSQL backend (feature `postgres-backend`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod explorer;
#[cfg(feature = "postgres-backend")]
pub mod postgres;
pub mod reports;

pub use cache::{CacheStats, CachedExecutor};
pub use explorer::{read_only_select, run_select};
#[cfg(feature = "postgres-backend")]
pub use postgres::PostgresExecutor;
pub use reports::{ReportParams, ReportQuery, ReportScope};

/// Error type for database operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Query result row as a JSON value
pub type QueryRow = serde_json::Value;

/// Query result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data
    pub rows: Vec<QueryRow>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(columns: Vec<String>, rows: Vec<QueryRow>) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms: 0,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a plain-text table
    pub fn to_table(&self) -> String {
        if self.columns.is_empty() {
            return "(no rows)".to_string();
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| match row.get(c) {
                        None | Some(serde_json::Value::Null) => "NULL".to_string(),
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                    })
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |values: &[String]| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<width$}", v, width = w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = Vec::with_capacity(cells.len() + 2);
        out.push(line(self.columns.as_slice()));
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        out.extend(cells.iter().map(|r| line(r.as_slice())));
        out.join("\n")
    }
}

/// Executes parameterized SQL against the reporting database
#[async_trait(?Send)]
pub trait QueryExecutor {
    /// Execute a parameterized SQL query
    ///
    /// # Arguments
    /// * `sql` - SQL query with parameter placeholders ($1, $2, etc.)
    /// * `params` - Parameter values as JSON
    ///
    /// # Returns
    /// Query result with columns and rows
    async fn execute(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> DatabaseResult<QueryResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_result_counts() {
        let result = QueryResult::new(vec!["season".into()], vec![json!({"season": 2020})]);
        assert_eq!(result.row_count(), 1);
        assert!(!result.is_empty());
        assert!(QueryResult::empty().is_empty());
    }

    #[test]
    fn test_to_table() {
        let result = QueryResult::new(
            vec!["team_name".into(), "points".into()],
            vec![
                json!({"team_name": "Barcelona", "points": 87}),
                json!({"team_name": "Real Madrid", "points": null}),
            ],
        );

        let table = result.to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "team_name   | points");
        assert_eq!(lines[1], "------------+-------");
        assert_eq!(lines[2], "Barcelona   | 87");
        assert_eq!(lines[3], "Real Madrid | NULL");
    }
}

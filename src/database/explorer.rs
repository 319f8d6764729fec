//! Ad-hoc read-only queries
//!
//! Only a single `SELECT` statement is accepted. Columns that are not text,
//! integer, float or boolean come back as null; cast them in the query.

use super::{DatabaseError, DatabaseResult, QueryExecutor, QueryResult};

/// Check that `sql` is one `SELECT` statement and return it without the
/// trailing semicolon.
pub fn read_only_select(sql: &str) -> DatabaseResult<&str> {
    let statement = sql.trim().trim_end_matches(';').trim_end();

    let keyword = statement.get(..6);
    let boundary = statement[keyword.map_or(0, str::len)..].chars().next();
    let is_select = keyword.is_some_and(|k| k.eq_ignore_ascii_case("select"))
        && boundary.is_some_and(|c| !c.is_alphanumeric() && c != '_');
    if !is_select {
        return Err(DatabaseError::InvalidInput(
            "Only SELECT queries are allowed".to_string(),
        ));
    }
    if statement.contains(';') {
        return Err(DatabaseError::InvalidInput(
            "Only a single statement is allowed".to_string(),
        ));
    }
    Ok(statement)
}

/// Validate and run an ad-hoc query without parameters
pub async fn run_select<E: QueryExecutor + ?Sized>(
    executor: &E,
    sql: &str,
) -> DatabaseResult<QueryResult> {
    let statement = read_only_select(sql)?;
    tracing::debug!("Running ad-hoc query");
    executor.execute(statement, &[]).await
}

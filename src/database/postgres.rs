//! PostgreSQL query executor
//!
//! Runs report queries directly against the Supabase Postgres instance.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_postgres::Row;
use tokio_postgres::types::{ToSql, Type};

use super::{DatabaseError, DatabaseResult, QueryExecutor, QueryResult};

type SqlParam = Box<dyn ToSql + Sync>;

/// PostgreSQL query executor
pub struct PostgresExecutor {
    /// Connection string
    connection_string: String,
    /// PostgreSQL client (wrapped for async access)
    client: Arc<Mutex<tokio_postgres::Client>>,
}

impl PostgresExecutor {
    /// Connect and spawn the connection driver on the current runtime
    pub async fn connect(connection_string: &str) -> DatabaseResult<Self> {
        let (client, connection) =
            tokio_postgres::connect(connection_string, tokio_postgres::NoTls)
                .await
                .map_err(|e| {
                    DatabaseError::ConnectionFailed(format!(
                        "Failed to connect to PostgreSQL: {}",
                        e
                    ))
                })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        let executor = Self {
            connection_string: connection_string.to_string(),
            client: Arc::new(Mutex::new(client)),
        };
        tracing::info!("Connected to {}", executor.connection_string_masked());
        Ok(executor)
    }

    /// Get the connection string (masked for security)
    pub fn connection_string_masked(&self) -> String {
        mask_password(&self.connection_string)
    }

    /// Convert JSON parameters to the types the prepared statement expects.
    ///
    /// Nulls are bound with the placeholder's type so `$1::bigint IS NULL`
    /// filters work.
    fn bind(params: &[Value], types: &[Type]) -> DatabaseResult<Vec<SqlParam>> {
        if params.len() != types.len() {
            return Err(DatabaseError::InvalidInput(format!(
                "Expected {} parameter(s), got {}",
                types.len(),
                params.len()
            )));
        }

        params
            .iter()
            .zip(types)
            .enumerate()
            .map(|(i, (value, ty))| {
                let param: SqlParam = match value {
                    Value::Null => match *ty {
                        Type::INT8 => Box::new(Option::<i64>::None),
                        Type::INT4 => Box::new(Option::<i32>::None),
                        Type::FLOAT8 => Box::new(Option::<f64>::None),
                        Type::BOOL => Box::new(Option::<bool>::None),
                        _ => Box::new(Option::<String>::None),
                    },
                    Value::Bool(b) => Box::new(*b),
                    Value::Number(n) => match (ty, n.as_i64(), n.as_f64()) {
                        (&Type::FLOAT8, _, Some(float)) => Box::new(float),
                        (&Type::INT4, Some(int), _) => {
                            Box::new(i32::try_from(int).map_err(|_| out_of_range(i, n))?)
                        }
                        (_, Some(int), _) => Box::new(int),
                        (_, None, Some(float)) => Box::new(float),
                        _ => return Err(out_of_range(i, n)),
                    },
                    Value::String(s) => Box::new(s.clone()),
                    other => {
                        return Err(DatabaseError::InvalidInput(format!(
                            "Parameter ${} has unsupported type: {}",
                            i + 1,
                            other
                        )));
                    }
                };
                Ok(param)
            })
            .collect()
    }

    /// Convert a PostgreSQL row to a JSON object keyed by column name
    fn row_to_json(row: &Row) -> Value {
        let map = row
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| (column.name().to_string(), column_value(row, i, column.type_())))
            .collect();
        Value::Object(map)
    }
}

fn out_of_range(index: usize, n: &serde_json::Number) -> DatabaseError {
    DatabaseError::InvalidInput(format!("Parameter ${} is out of range: {}", index + 1, n))
}

/// Decode one column; anything that is not text, integer, float or boolean
/// is returned as null
fn column_value(row: &Row, idx: usize, ty: &Type) -> Value {
    let value = match *ty {
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::from)),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx).map(|v| v.map(Value::from)),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx).map(|v| v.map(Value::from)),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .map(|v| v.and_then(serde_json::Number::from_f64).map(Value::Number)),
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::Bool)),
        _ => row.try_get::<_, Option<String>>(idx).map(|v| v.map(Value::String)),
    };
    value.ok().flatten().unwrap_or(Value::Null)
}

#[async_trait(?Send)]
impl QueryExecutor for PostgresExecutor {
    async fn execute(&self, sql: &str, params: &[Value]) -> DatabaseResult<QueryResult> {
        let start = Instant::now();
        let client = self.client.lock().await;

        let statement = client
            .prepare(sql)
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;
        let bound = Self::bind(params, statement.params())?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p.as_ref()).collect();

        let rows = client
            .query(&statement, &param_refs)
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        Ok(QueryResult {
            columns: statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            rows: rows.iter().map(Self::row_to_json).collect(),
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Replace the password in a connection URL with `****`
pub fn mask_password(connection_string: &str) -> String {
    if let Some(at_pos) = connection_string.rfind('@')
        && let Some(colon_pos) = connection_string[..at_pos].rfind(':')
        && connection_string[..colon_pos].contains("//")
    {
        let prefix = &connection_string[..colon_pos + 1];
        let suffix = &connection_string[at_pos..];
        return format!("{}****{}", prefix, suffix);
    }
    connection_string.to_string()
}

//! Destination table store abstraction

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::error::{StoreError, StoreResult};
use super::value::{CellValue, Record};

/// A remote tabular store accepting row inserts by table name.
///
/// Each call is its own remote operation; no transaction spans calls.
pub trait TableStore {
    /// Human-readable description for log lines
    fn describe(&self) -> String;

    /// Verify the store is reachable and accepts the credentials
    fn check_connection(&self) -> StoreResult<()>;

    /// Insert an ordered batch of records as one request
    fn insert_rows(&self, table: &str, rows: &[Record]) -> StoreResult<()>;

    /// Insert a single record
    fn insert_row(&self, table: &str, row: &Record) -> StoreResult<()> {
        self.insert_rows(table, std::slice::from_ref(row))
    }
}

#[derive(Debug, Clone)]
enum Rule {
    RejectTable(String),
    RejectBulk(String),
    RequireNumeric { table: String, column: String },
    MaxTextLength { table: String, column: String, max: usize },
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Record>>,
    insert_calls: usize,
}

/// In-process store used for dry runs and tests.
///
/// Batches are applied atomically: a batch with any rejected row stores nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    rules: Vec<Rule>,
    unreachable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every insert into `table`
    pub fn reject_table(mut self, table: &str) -> Self {
        self.rules.push(Rule::RejectTable(table.to_string()));
        self
    }

    /// Reject multi-row inserts into `table`, accepting single rows
    pub fn reject_bulk(mut self, table: &str) -> Self {
        self.rules.push(Rule::RejectBulk(table.to_string()));
        self
    }

    /// Reject rows whose `column` holds text that does not read as a number,
    /// as a `numeric` database column would
    pub fn require_numeric(mut self, table: &str, column: &str) -> Self {
        self.rules.push(Rule::RequireNumeric {
            table: table.to_string(),
            column: column.to_string(),
        });
        self
    }

    /// Reject rows whose `column` text exceeds `max` characters, as a
    /// `varchar(max)` column would
    pub fn max_text_length(mut self, table: &str, column: &str, max: usize) -> Self {
        self.rules.push(Rule::MaxTextLength {
            table: table.to_string(),
            column: column.to_string(),
            max,
        });
        self
    }

    /// Fail the connection check
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Rows persisted in `table`
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, Vec::len)
    }

    /// Number of insert requests received, successful or not
    pub fn insert_calls(&self) -> usize {
        self.lock().insert_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_rules(&self, table: &str, rows: &[Record]) -> StoreResult<()> {
        for rule in &self.rules {
            match rule {
                Rule::RejectTable(t) if t == table => {
                    return Err(rejected(table, "table rejects all rows".to_string()));
                }
                Rule::RejectBulk(t) if t == table && rows.len() > 1 => {
                    return Err(rejected(table, "bulk insert refused".to_string()));
                }
                Rule::RequireNumeric { table: t, column } if t == table => {
                    if let Some(bad) = rows
                        .iter()
                        .find_map(|r| match r.get(column) {
                            Some(CellValue::Text(text))
                                if CellValue::parse_number(text).is_none() =>
                            {
                                Some(text)
                            }
                            _ => None,
                        })
                    {
                        return Err(rejected(
                            table,
                            format!("invalid input syntax for type numeric: \"{}\"", bad),
                        ));
                    }
                }
                Rule::MaxTextLength { table: t, column, max } if t == table => {
                    let too_long = rows.iter().any(|r| {
                        matches!(r.get(column), Some(CellValue::Text(text)) if text.chars().count() > *max)
                    });
                    if too_long {
                        return Err(rejected(
                            table,
                            format!("value too long for type character varying({})", max),
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn rejected(table: &str, message: String) -> StoreError {
    StoreError::Rejected {
        table: table.to_string(),
        status: 400,
        message,
    }
}

impl TableStore for MemoryStore {
    fn describe(&self) -> String {
        "in-memory store".to_string()
    }

    fn check_connection(&self) -> StoreResult<()> {
        if self.unreachable {
            return Err(StoreError::Unreachable(
                "memory store marked unreachable".to_string(),
            ));
        }
        Ok(())
    }

    fn insert_rows(&self, table: &str, rows: &[Record]) -> StoreResult<()> {
        self.lock().insert_calls += 1;
        self.check_rules(table, rows)?;

        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: CellValue) -> Record {
        Record::from_pairs([("xGoal", value)])
    }

    #[test]
    fn test_insert_and_count() {
        let store = MemoryStore::new();
        store
            .insert_rows("shots_temp", &[row(CellValue::Decimal(0.1)), row(CellValue::Null)])
            .unwrap();
        store.insert_row("shots_temp", &row(CellValue::Integer(1))).unwrap();

        assert_eq!(store.row_count("shots_temp"), 3);
        assert_eq!(store.row_count("games_temp"), 0);
        assert_eq!(store.insert_calls(), 2);
    }

    #[test]
    fn test_require_numeric_rejects_whole_batch() {
        let store = MemoryStore::new().require_numeric("shots_temp", "xGoal");
        let batch = [row(CellValue::Decimal(0.1)), row(CellValue::Text("x".into()))];

        let err = store.insert_rows("shots_temp", &batch).unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 400, .. }));
        assert_eq!(store.row_count("shots_temp"), 0);

        store.insert_row("shots_temp", &batch[0]).unwrap();
        assert_eq!(store.row_count("shots_temp"), 1);
    }

    #[test]
    fn test_require_numeric_accepts_numeric_text() {
        let store = MemoryStore::new().require_numeric("shots_temp", "xGoal");
        let batch = [
            row(CellValue::Text("0.05".into())),
            row(CellValue::Text(" 3 ".into())),
            row(CellValue::Null),
        ];

        store.insert_rows("shots_temp", &batch).unwrap();
        assert_eq!(store.row_count("shots_temp"), 3);

        let err = store
            .insert_row("shots_temp", &row(CellValue::Text("abc".into())))
            .unwrap_err();
        assert!(err.to_string().contains("invalid input syntax for type numeric"));
    }

    #[test]
    fn test_reject_bulk_accepts_single_rows() {
        let store = MemoryStore::new().reject_bulk("teams_temp");
        let batch = [row(CellValue::Integer(1)), row(CellValue::Integer(2))];

        assert!(store.insert_rows("teams_temp", &batch).is_err());
        assert!(store.insert_row("teams_temp", &batch[0]).is_ok());
    }

    #[test]
    fn test_max_text_length() {
        let store = MemoryStore::new().max_text_length("teams_temp", "name", 5);
        let short = Record::from_pairs([("name", CellValue::Text("Lille".into()))]);
        let long = Record::from_pairs([("name", CellValue::Text("Marseille".into()))]);

        assert!(store.insert_rows("teams_temp", &[short.clone(), long]).is_err());
        assert!(store.insert_row("teams_temp", &short).is_ok());
    }

    #[test]
    fn test_unreachable() {
        let store = MemoryStore::new().unreachable();
        assert!(matches!(
            store.check_connection(),
            Err(StoreError::Unreachable(_))
        ));
    }
}

//! Table import driver: resolve, stream, clean, submit

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::clean::{Cleaner, TypeStrategy};
use super::error::{LoaderError, LoaderResult};
use super::mapping::{FileResolution, SourceMapping, TableSource};
use super::reader::ChunkReader;
use super::store::TableStore;
use super::value::Record;
use super::{DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE};

/// Maximum number of error messages kept per table
const MAX_ERRORS: usize = 100;

/// Knobs for an import run
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    /// Rows read from a file at a time
    pub chunk_size: usize,
    /// Rows sent per insert request
    pub batch_size: usize,
    /// Directory that relative source paths are resolved against
    pub data_dir: PathBuf,
    /// How column types are decided
    pub type_strategy: TypeStrategy,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            data_dir: PathBuf::from("."),
            type_strategy: TypeStrategy::default(),
        }
    }
}

impl ImportSettings {
    pub fn validate(&self) -> LoaderResult<()> {
        if self.chunk_size == 0 {
            return Err(LoaderError::InvalidSetting(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(LoaderError::InvalidSetting(
                "batch size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a table's import ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    /// The file was read to the end
    Imported,
    /// Neither the primary nor the fallback file exists
    MissingFile,
    /// Processing stopped early; rows inserted before the error are kept
    Failed { error: String },
}

/// Per-table result of an import run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    pub table: String,
    pub source: Option<PathBuf>,
    pub used_fallback: bool,
    pub outcome: TableOutcome,
    /// Data rows read from the file
    pub rows_read: usize,
    /// Rows the store accepted
    pub rows_inserted: usize,
    /// Rows dropped after an individual insert failed
    pub rows_skipped: usize,
    pub batches: usize,
    /// Batches that fell back to row-by-row inserts
    pub failed_batches: usize,
    /// Values nulled because they did not fit the column type
    pub coerced_nulls: usize,
    /// NaN/Infinity values sent as null
    pub non_finite_nulls: usize,
    /// Error messages (limited to the first 100)
    pub errors: Vec<String>,
}

impl TableReport {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            source: None,
            used_fallback: false,
            outcome: TableOutcome::Imported,
            rows_read: 0,
            rows_inserted: 0,
            rows_skipped: 0,
            batches: 0,
            failed_batches: 0,
            coerced_nulls: 0,
            non_finite_nulls: 0,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
    }
}

/// Result of a whole import run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub started_at: DateTime<Utc>,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// One entry per configured table, in mapping order
    pub tables: Vec<TableReport>,
}

impl ImportSummary {
    /// Rows inserted across all tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows_inserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.rows_skipped).sum()
    }

    pub fn get(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }

    /// Rows inserted into `table`, zero for unknown tables
    pub fn rows_for(&self, table: &str) -> usize {
        self.get(table).map_or(0, |t| t.rows_inserted)
    }

    /// Pretty-printed JSON document of the run
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let secs = self.duration.as_secs();
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else {
            format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(70);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Import Summary")?;
        writeln!(f, "{}", rule)?;
        for table in &self.tables {
            let marker = match (&table.outcome, table.rows_inserted) {
                (TableOutcome::Failed { .. }, _) => "!!",
                (_, 0) => "--",
                _ => "ok",
            };
            writeln!(
                f,
                "[{}] {:25}: {:>10} rows",
                marker,
                table.table,
                format_count(table.rows_inserted)
            )?;
        }
        writeln!(f, "{}", "-".repeat(70))?;
        writeln!(
            f,
            "     {:25}: {:>10} rows",
            "TOTAL",
            format_count(self.total_rows())
        )?;
        write!(f, "{}", rule)
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Format a count with thousands separators
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Streams configured CSV sources into a [`TableStore`].
///
/// Tables, chunks and batches are processed strictly in order on the calling
/// thread.
pub struct Importer<'a, S: TableStore + ?Sized> {
    store: &'a S,
    settings: ImportSettings,
}

impl<'a, S: TableStore + ?Sized> Importer<'a, S> {
    pub fn new(store: &'a S, settings: ImportSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Import every table of `mapping`.
    ///
    /// Fails only on setup errors (invalid settings, store unreachable),
    /// before any file is touched. Per-table problems end up in the summary.
    pub fn run(&self, mapping: &SourceMapping) -> LoaderResult<ImportSummary> {
        self.settings.validate()?;
        self.store.check_connection().map_err(LoaderError::Setup)?;
        tracing::info!("Connected to {}", self.store.describe());

        let started_at = Utc::now();
        let start = Instant::now();

        let tables = mapping
            .tables
            .iter()
            .map(|source| self.import_table(source))
            .collect();

        Ok(ImportSummary {
            started_at,
            duration: start.elapsed(),
            tables,
        })
    }

    /// Import one table; never fails, problems are recorded in the report
    pub fn import_table(&self, source: &TableSource) -> TableReport {
        let mut report = TableReport::new(&source.name);

        let path = match source.resolve(&self.settings.data_dir) {
            FileResolution::Primary(path) => path,
            FileResolution::Fallback(path) => {
                tracing::info!("Using fallback file: {}", path.display());
                report.used_fallback = true;
                path
            }
            FileResolution::Missing => {
                match &source.fallback {
                    Some(fallback) => tracing::warn!(
                        "Skipping {}: CSV file not found (expected {} or {})",
                        source.name,
                        source.file.display(),
                        fallback.display()
                    ),
                    None => tracing::warn!(
                        "Skipping {}: CSV file not found (expected {})",
                        source.name,
                        source.file.display()
                    ),
                }
                report.outcome = TableOutcome::MissingFile;
                return report;
            }
        };

        tracing::info!("Importing {} -> {}", file_label(&path), source.name);
        report.source = Some(path.clone());

        if let Err(e) = self.import_file(source, &path, &mut report) {
            tracing::error!("Error importing {}: {}", file_label(&path), e);
            report.add_error(e.to_string());
            report.outcome = TableOutcome::Failed {
                error: e.to_string(),
            };
        }

        tracing::info!(
            "Completed: {} rows imported to {}",
            format_count(report.rows_inserted),
            source.name
        );
        report
    }

    fn import_file(
        &self,
        source: &TableSource,
        path: &Path,
        report: &mut TableReport,
    ) -> LoaderResult<()> {
        let mut reader = ChunkReader::open(path, self.settings.chunk_size)?;

        let missing: Vec<&str> = source
            .columns
            .iter()
            .filter(|c| !reader.headers().contains(c))
            .map(String::as_str)
            .collect();
        if missing.len() == source.columns.len() {
            return Err(LoaderError::NoMatchingColumns {
                path: path.to_path_buf(),
            });
        }
        if !missing.is_empty() {
            tracing::warn!(
                "{} is missing expected column(s): {}",
                file_label(path),
                missing.join(", ")
            );
        }

        let mut cleaner = Cleaner::new(&source.columns, self.settings.type_strategy)
            .with_declared_types(source.types.clone());

        while let Some(chunk) = reader.next_chunk()? {
            report.rows_read += chunk.len();
            let cleaned = cleaner.clean(&chunk);
            report.coerced_nulls += cleaned.coerced_nulls;
            report.non_finite_nulls += cleaned.non_finite_nulls;

            let mut first_row = chunk.first_row;
            for batch in cleaned.records.chunks(self.settings.batch_size) {
                report.batches += 1;
                self.submit_batch(&source.name, batch, first_row, report);
                first_row += batch.len();
            }
        }

        Ok(())
    }

    /// Bulk insert, falling back to one insert per row on failure
    fn submit_batch(
        &self,
        table: &str,
        batch: &[Record],
        first_row: usize,
        report: &mut TableReport,
    ) {
        let number = report.batches;

        match self.store.insert_rows(table, batch) {
            Ok(()) => {
                report.rows_inserted += batch.len();
                tracing::info!(
                    "Inserted batch {} ({} rows) - Total: {}",
                    number,
                    batch.len(),
                    format_count(report.rows_inserted)
                );
            }
            Err(e) => {
                report.failed_batches += 1;
                tracing::warn!(
                    "Error inserting batch {}: {}; retrying row by row",
                    number,
                    e
                );

                let mut inserted = 0;
                for (offset, record) in batch.iter().enumerate() {
                    match self.store.insert_row(table, record) {
                        Ok(()) => inserted += 1,
                        Err(e) => {
                            let row = first_row + offset;
                            tracing::warn!("Skipped problematic row {}: {}", row, e);
                            report.rows_skipped += 1;
                            report.add_error(format!("row {}: {}", row, e));
                        }
                    }
                }

                report.rows_inserted += inserted;
                tracing::info!(
                    "Batch {}: {} of {} rows inserted individually - Total: {}",
                    number,
                    inserted,
                    batch.len(),
                    format_count(report.rows_inserted)
                );
            }
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::store::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    fn settings(dir: &Path, chunk_size: usize, batch_size: usize) -> ImportSettings {
        ImportSettings {
            chunk_size,
            batch_size,
            data_dir: dir.to_path_buf(),
            type_strategy: TypeStrategy::Sample,
        }
    }

    fn write_teams(dir: &Path, rows: usize) {
        let mut content = String::from("teamID,name,founded\n");
        for i in 0..rows {
            content.push_str(&format!("{},Team {},1900\n", i + 1, i + 1));
        }
        fs::write(dir.join("teams.csv"), content).unwrap();
    }

    fn teams_mapping() -> SourceMapping {
        SourceMapping::new(vec![TableSource::new(
            "teams_temp",
            "teams.csv",
            &["teamID", "name"],
        )])
    }

    #[test]
    fn test_batches_split_across_chunks() {
        let dir = TempDir::new().unwrap();
        write_teams(dir.path(), 25);
        let store = MemoryStore::new();

        let summary = Importer::new(&store, settings(dir.path(), 10, 4))
            .run(&teams_mapping())
            .unwrap();

        let report = summary.get("teams_temp").unwrap();
        assert_eq!(report.rows_read, 25);
        assert_eq!(report.rows_inserted, 25);
        // 10 -> 4,4,2 / 10 -> 4,4,2 / 5 -> 4,1
        assert_eq!(report.batches, 8);
        assert_eq!(store.insert_calls(), 8);
    }

    #[test]
    fn test_records_keep_only_expected_columns() {
        let dir = TempDir::new().unwrap();
        write_teams(dir.path(), 1);
        let store = MemoryStore::new();

        Importer::new(&store, settings(dir.path(), 10, 10))
            .run(&teams_mapping())
            .unwrap();

        let rows = store.rows("teams_temp");
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["teamID", "name"]);
    }

    #[test]
    fn test_bulk_failure_falls_back_to_rows() {
        let dir = TempDir::new().unwrap();
        write_teams(dir.path(), 5);
        let store = MemoryStore::new().reject_bulk("teams_temp");

        let summary = Importer::new(&store, settings(dir.path(), 10, 5))
            .run(&teams_mapping())
            .unwrap();

        let report = summary.get("teams_temp").unwrap();
        assert_eq!(report.rows_inserted, 5);
        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.rows_skipped, 0);
        // one bulk attempt plus five single-row inserts
        assert_eq!(store.insert_calls(), 6);
    }

    #[test]
    fn test_no_matching_columns_fails_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("teams.csv"), "id,label\n1,a\n").unwrap();
        let store = MemoryStore::new();

        let summary = Importer::new(&store, settings(dir.path(), 10, 10))
            .run(&teams_mapping())
            .unwrap();

        let report = summary.get("teams_temp").unwrap();
        assert!(matches!(report.outcome, TableOutcome::Failed { .. }));
        assert_eq!(store.insert_calls(), 0);
    }

    #[test]
    fn test_invalid_settings_fail_run() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let result = Importer::new(&store, settings(dir.path(), 10, 0)).run(&teams_mapping());
        assert!(matches!(result, Err(LoaderError::InvalidSetting(_))));
    }

    #[test]
    fn test_unreachable_store_fails_before_files() {
        let dir = TempDir::new().unwrap();
        write_teams(dir.path(), 3);
        let store = MemoryStore::new().unreachable();

        let result = Importer::new(&store, settings(dir.path(), 10, 10)).run(&teams_mapping());
        assert!(matches!(result, Err(LoaderError::Setup(_))));
        assert_eq!(store.insert_calls(), 0);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(2500), "2,500");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_summary_display() {
        let mut imported = TableReport::new("teams_temp");
        imported.rows_inserted = 2500;
        let mut missing = TableReport::new("leagues_temp");
        missing.outcome = TableOutcome::MissingFile;

        let summary = ImportSummary {
            started_at: Utc::now(),
            duration: Duration::from_secs(90),
            tables: vec![missing, imported],
        };

        let text = summary.to_string();
        assert!(text.contains("[--] leagues_temp"));
        assert!(text.contains("[ok] teams_temp"));
        assert!(text.contains("2,500 rows"));
        assert_eq!(summary.duration_string(), "1m 30s");
    }

    #[test]
    fn test_summary_json() {
        let mut imported = TableReport::new("teams_temp");
        imported.rows_inserted = 12;
        imported.source = Some(PathBuf::from("data/teams.csv"));
        let mut failed = TableReport::new("shots_temp");
        failed.outcome = TableOutcome::Failed {
            error: "row 3 has 9 fields".to_string(),
        };

        let started_at = DateTime::parse_from_rfc3339("2024-05-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let summary = ImportSummary {
            started_at,
            duration: Duration::from_millis(1500),
            tables: vec![imported, failed],
        };

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["startedAt"], "2024-05-01T09:30:00Z");
        assert_eq!(json["durationMs"], 1500);
        assert_eq!(json["tables"][0]["table"], "teams_temp");
        assert_eq!(json["tables"][0]["rowsInserted"], 12);
        assert_eq!(json["tables"][0]["outcome"]["status"], "imported");
        assert_eq!(json["tables"][1]["outcome"]["status"], "failed");
        assert_eq!(json["tables"][1]["outcome"]["error"], "row 3 has 9 fields");
        assert_eq!(json["tables"][1]["nonFiniteNulls"], 0);
    }
}

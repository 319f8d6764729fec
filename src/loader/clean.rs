//! Chunk cleaning: projection, null normalization and type coercion

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::reader::Chunk;
use super::value::{CellValue, ColumnType, Record};

/// How column types are decided for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeStrategy {
    /// Infer from the first chunk holding values and keep that type for the rest of the file
    #[default]
    Sample,
    /// Infer independently for every chunk
    PerChunk,
}

impl std::str::FromStr for TypeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sample" => Ok(TypeStrategy::Sample),
            "per-chunk" | "per_chunk" => Ok(TypeStrategy::PerChunk),
            _ => Err(format!(
                "Unknown type strategy: {}. Use 'sample' or 'per-chunk'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for TypeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeStrategy::Sample => write!(f, "sample"),
            TypeStrategy::PerChunk => write!(f, "per-chunk"),
        }
    }
}

/// Output of cleaning one chunk
#[derive(Debug, Clone, Default)]
pub struct CleanedChunk {
    /// Cleaned records, in chunk order
    pub records: Vec<Record>,
    /// Values nulled because they did not parse as the column's numeric type
    pub coerced_nulls: usize,
    /// NaN/Infinity values nulled by the final pass
    pub non_finite_nulls: usize,
}

/// Cleans chunks of one source file.
///
/// A cleaner is created per file; with [`TypeStrategy::Sample`] it remembers
/// the column types decided on earlier chunks.
#[derive(Debug, Clone)]
pub struct Cleaner {
    columns: Vec<String>,
    strategy: TypeStrategy,
    declared: HashMap<String, ColumnType>,
    committed: HashMap<String, ColumnType>,
}

impl Cleaner {
    pub fn new(columns: &[String], strategy: TypeStrategy) -> Self {
        Self {
            columns: columns.to_vec(),
            strategy,
            declared: HashMap::new(),
            committed: HashMap::new(),
        }
    }

    /// Pin column types instead of inferring them
    pub fn with_declared_types<I>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (String, ColumnType)>,
    {
        self.declared.extend(types);
        self
    }

    /// Types committed so far by sampling
    pub fn committed_types(&self) -> &HashMap<String, ColumnType> {
        &self.committed
    }

    /// Clean one chunk.
    ///
    /// Steps run in a fixed order: project to the expected columns, turn
    /// blank and `NA` text into null, coerce numeric columns, then null any
    /// non-finite number.
    pub fn clean(&mut self, chunk: &Chunk) -> CleanedChunk {
        let available: Vec<(String, usize)> = self
            .columns
            .iter()
            .filter_map(|c| chunk.column_index(c).map(|i| (c.clone(), i)))
            .collect();

        let mut out = CleanedChunk::default();
        let mut columns: Vec<Vec<CellValue>> = Vec::with_capacity(available.len());

        for (name, index) in &available {
            let raw: Vec<Option<&str>> = chunk
                .rows
                .iter()
                .map(|row| row.get(*index).and_then(|v| normalize_null(v.as_deref())))
                .collect();

            let column_type = self.resolve_type(name, &raw);
            let mut misses = 0;
            let values = raw
                .iter()
                .map(|v| match v {
                    None => CellValue::Null,
                    Some(text) => coerce(text, column_type, &mut misses),
                })
                .collect();

            if misses > 0 {
                tracing::warn!(
                    "Column '{}' is typed {} but {} value(s) in rows {}..{} did not parse; sent as null",
                    name,
                    column_type.map(|t| t.to_string()).unwrap_or_default(),
                    misses,
                    chunk.first_row,
                    chunk.first_row + chunk.len().saturating_sub(1)
                );
            }
            out.coerced_nulls += misses;
            columns.push(values);
        }

        out.records.reserve(chunk.len());
        for row in 0..chunk.len() {
            let mut record = Record::new();
            for (col, (name, _)) in available.iter().enumerate() {
                let value = std::mem::replace(&mut columns[col][row], CellValue::Null);
                if value.is_non_finite() {
                    out.non_finite_nulls += 1;
                }
                record.insert(name.as_str(), value.into_finite());
            }
            out.records.push(record);
        }

        out
    }

    fn resolve_type(&mut self, name: &str, values: &[Option<&str>]) -> Option<ColumnType> {
        if let Some(declared) = self.declared.get(name) {
            return Some(*declared);
        }
        if self.strategy == TypeStrategy::Sample
            && let Some(committed) = self.committed.get(name)
        {
            return Some(*committed);
        }

        let inferred = infer_type(values.iter().flatten().copied());
        if self.strategy == TypeStrategy::Sample
            && let Some(column_type) = inferred
        {
            tracing::debug!("Committed column '{}' as {}", name, column_type);
            self.committed.insert(name.to_string(), column_type);
        }
        inferred
    }
}

/// Decide a type from non-null values, `None` when there are none
pub fn infer_type<'a>(values: impl Iterator<Item = &'a str>) -> Option<ColumnType> {
    let mut seen = None;
    for value in values {
        match CellValue::parse_number(value) {
            Some(CellValue::Integer(_)) => {
                if seen.is_none() {
                    seen = Some(ColumnType::Integer);
                }
            }
            Some(_) => seen = Some(ColumnType::Decimal),
            None => return Some(ColumnType::Text),
        }
    }
    seen
}

fn normalize_null(value: Option<&str>) -> Option<&str> {
    match value {
        Some(v) if v.trim().is_empty() || v == "NA" => None,
        other => other,
    }
}

fn coerce(text: &str, column_type: Option<ColumnType>, misses: &mut usize) -> CellValue {
    match column_type {
        Some(ColumnType::Integer) => match CellValue::parse_number(text) {
            Some(value) => value,
            None => {
                *misses += 1;
                CellValue::Null
            }
        },
        Some(ColumnType::Decimal) => match CellValue::parse_number(text) {
            Some(value) => value.into_decimal(),
            None => {
                *misses += 1;
                CellValue::Null
            }
        },
        Some(ColumnType::Text) | None => CellValue::Text(text.to_string()),
    }
}

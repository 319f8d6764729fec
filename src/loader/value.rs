//! Scalar values and records sent to destination tables

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Column type decided for a cleaned column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Whole numbers
    Integer,
    /// Numbers with a fractional part
    Decimal,
    /// Anything else
    Text,
}

impl ColumnType {
    /// Whether values of this type are sent as JSON numbers
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Decimal)
    }
}

impl std::str::FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integer" | "int" => Ok(ColumnType::Integer),
            "decimal" | "float" | "numeric" => Ok(ColumnType::Decimal),
            "text" | "string" => Ok(ColumnType::Text),
            _ => Err(format!(
                "Unknown column type: {}. Use 'integer', 'decimal' or 'text'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Decimal => write!(f, "decimal"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// A single scalar cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl CellValue {
    /// Parse a raw CSV field as a number.
    ///
    /// Integral text becomes `Integer`, anything else `f64` accepts becomes
    /// `Decimal` (including `nan` and `inf`, which the cleaner later nulls).
    pub fn parse_number(raw: &str) -> Option<CellValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(CellValue::Integer(n));
        }
        trimmed.parse::<f64>().ok().map(CellValue::Decimal)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// True for NaN and infinite decimals
    pub fn is_non_finite(&self) -> bool {
        matches!(self, CellValue::Decimal(f) if !f.is_finite())
    }

    /// Replace non-finite decimals with null
    pub fn into_finite(self) -> CellValue {
        if self.is_non_finite() {
            CellValue::Null
        } else {
            self
        }
    }

    /// Widen an integer to a decimal, leaving other values untouched
    pub fn into_decimal(self) -> CellValue {
        match self {
            CellValue::Integer(n) => CellValue::Decimal(n as f64),
            other => other,
        }
    }

    /// Render the value back to CSV text, `None` for null.
    ///
    /// Decimals keep a fractional marker (`2.0`, not `2`) so re-parsing the
    /// text yields the same variant.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(n) => Some(n.to_string()),
            CellValue::Decimal(f) => Some(format!("{:?}", f)),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Decimal(d) => write!(f, "{}", d),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row as an ordered column-name to value mapping
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from ordered pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            record.insert(key, value);
        }
        record
    }

    /// Insert or replace a value, keeping first-insertion order
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

//! Error types for the loader

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, cleaning or importing a source file
#[derive(Error, Debug)]
pub enum LoaderError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error in {path}: {error}")]
    Csv { path: PathBuf, error: String },

    /// A data row has more fields than the header declares
    #[error("Malformed row {row} in {path}: expected {expected} fields, found {found}")]
    MalformedRow {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// None of the expected columns appear in the file header
    #[error("None of the expected columns were found in {path}")]
    NoMatchingColumns { path: PathBuf },

    /// The destination store could not be reached or refused the credentials
    #[error("Store setup failed: {0}")]
    Setup(#[source] StoreError),

    /// A table name was requested that is not part of the mapping
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Invalid loader setting
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors returned by a destination table store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// The request was sent but the store rejected it
    #[error("Insert into {table} rejected ({status}): {message}")]
    Rejected {
        table: String,
        status: u16,
        message: String,
    },

    /// Records could not be serialized for transport
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store was configured with unusable parameters
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

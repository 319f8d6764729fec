//! Bola loader - bulk loading and reporting for football statistics
//!
//! Provides:
//! - Chunked CSV import into Supabase staging tables
//! - Configuration from `.bola-loader.toml`, `.env` and the environment
//! - Cached analytical report queries over the loaded data

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod database;
pub mod loader;

// Re-export commonly used types
pub use config::{ConfigError, ConfigResult, Credentials, LoaderConfig};
pub use database::{
    CacheStats, CachedExecutor, DatabaseError, DatabaseResult, QueryExecutor, QueryResult,
    ReportParams, ReportQuery,
};
#[cfg(feature = "postgres-backend")]
pub use database::PostgresExecutor;
#[cfg(feature = "api-backend")]
pub use loader::SupabaseStore;
pub use loader::{
    ImportSettings, ImportSummary, Importer, LoaderError, LoaderResult, MemoryStore,
    SourceMapping, StoreError, TableSource, TableStore, TypeStrategy,
};

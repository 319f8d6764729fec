//! Batch table loader for CSV extracts
//!
//! This module streams flat CSV extracts (leagues, teams, players, games,
//! team stats, appearances, shots) into remote staging tables.
//!
//! ## Features
//!
//! - **Bounded memory** - Files are read in fixed-size row chunks, never materialized whole
//! - **Column projection** - Only the configured columns reach the destination
//! - **Type coercion** - Numeric columns are detected and sent as numbers, non-finite values as null
//! - **Two-tier submit** - A rejected batch is retried row by row so only bad rows are dropped
//!
//! ## Example
//!
//! ```rust,ignore
//! use bola_loader::loader::{Importer, ImportSettings, SourceMapping, SupabaseStore};
//!
//! let store = SupabaseStore::new(&url, &key)?;
//! let importer = Importer::new(&store, ImportSettings::default());
//!
//! let summary = importer.run(&SourceMapping::football())?;
//! println!("Imported {} rows", summary.total_rows());
//! ```

mod clean;
mod error;
mod import;
mod mapping;
mod reader;
mod store;
#[cfg(feature = "api-backend")]
mod supabase;
mod value;

pub use clean::{Cleaner, CleanedChunk, TypeStrategy};
pub use error::{LoaderError, LoaderResult, StoreError, StoreResult};
pub use import::{
    ImportSettings, ImportSummary, Importer, TableOutcome, TableReport, format_count,
};
pub use mapping::{FileResolution, SourceMapping, TableSource};
pub use reader::{Chunk, ChunkReader, NULL_TOKENS};
pub use store::{MemoryStore, TableStore};
#[cfg(feature = "api-backend")]
pub use supabase::SupabaseStore;
pub use value::{CellValue, ColumnType, Record};

/// Default number of rows read from a CSV file at a time
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Default number of rows sent per insert request
pub const DEFAULT_BATCH_SIZE: usize = 1000;

//! Import command: stream the CSV extracts into Supabase

use std::path::PathBuf;

use crate::cli::commands::load_config;
use crate::cli::commands::report::OutputFormat;
use crate::cli::error::CliError;
use crate::config::LoaderConfig;
use crate::loader::{
    ImportSettings, ImportSummary, Importer, MemoryStore, SourceMapping, SupabaseStore,
    TableStore, TypeStrategy,
};

/// Import command arguments
#[derive(Debug, Clone, Default)]
pub struct ImportArgs {
    /// Settings file
    pub config: Option<PathBuf>,
    /// Directory holding the CSV extracts
    pub data_dir: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub batch_size: Option<usize>,
    /// Restrict the run to these tables
    pub tables: Vec<String>,
    pub types: Option<TypeStrategy>,
    /// Read and clean everything but keep the rows in memory
    pub dry_run: bool,
    /// How the summary is printed
    pub format: OutputFormat,
}

impl ImportArgs {
    /// Settings from the config file with command-line overrides on top
    pub fn settings(&self, config: &LoaderConfig) -> ImportSettings {
        let mut settings = config.import_settings();
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(size) = self.chunk_size {
            settings.chunk_size = size;
        }
        if let Some(size) = self.batch_size {
            settings.batch_size = size;
        }
        if let Some(types) = self.types {
            settings.type_strategy = types;
        }
        settings
    }

    /// Configured mapping, narrowed to the requested tables
    pub fn mapping(&self, config: &LoaderConfig) -> Result<SourceMapping, CliError> {
        let mapping = config.mapping();
        if self.tables.is_empty() {
            Ok(mapping)
        } else {
            Ok(mapping.select(&self.tables)?)
        }
    }
}

/// Run an import and print the summary
pub fn handle_import(args: &ImportArgs) -> Result<ImportSummary, CliError> {
    let config = load_config(args.config.as_deref())?;
    let settings = args.settings(&config);
    let mapping = args.mapping(&config)?;

    if args.format == OutputFormat::Table {
        println!("{}", "=".repeat(70));
        println!("Supabase CSV Import");
        println!("{}", "=".repeat(70));
    }

    let summary = if args.dry_run {
        tracing::info!("Dry run: rows are kept in memory");
        run(&MemoryStore::new(), settings, &mapping)?
    } else {
        let credentials = config.credentials().map_err(CliError::from_config)?;
        let store = SupabaseStore::new(&credentials.url, &credentials.service_role_key)?
            .with_schema(config.import.schema.clone());
        run(&store, settings, &mapping)?
    };

    match args.format {
        OutputFormat::Table => {
            println!();
            println!("{}", summary);
            println!("{}", next_steps(&summary));
        }
        OutputFormat::Json => {
            let json = summary
                .to_json()
                .map_err(|e| CliError::IoError(format!("Failed to serialize summary: {}", e)))?;
            println!("{}", json);
        }
    }

    Ok(summary)
}

fn run<S: TableStore + ?Sized>(
    store: &S,
    settings: ImportSettings,
    mapping: &SourceMapping,
) -> Result<ImportSummary, CliError> {
    Ok(Importer::new(store, settings).run(mapping)?)
}

/// Closing advice printed after the summary
pub fn next_steps(summary: &ImportSummary) -> String {
    if summary.total_rows() > 0 {
        let mut lines = vec![
            format!("Import completed in {}.", summary.duration_string()),
            String::new(),
            "Next steps:".to_string(),
            "   1. Verify data in the Supabase dashboard".to_string(),
            "   2. Run bola-dml-supabase.sql to transform and load the data".to_string(),
            "   3. Check for any errors or warnings above".to_string(),
        ];
        if summary.total_skipped() > 0 {
            lines.insert(
                1,
                format!(
                    "{} rows were skipped after being rejected individually.",
                    crate::loader::format_count(summary.total_skipped())
                ),
            );
        }
        lines.join("\n")
    } else {
        [
            "No data was imported. Please check:",
            "   - CSV files exist in the data directory",
            "   - File names match the expected names",
            "   - Supabase connection is working",
            "   - Staging tables exist in the database",
        ]
        .join("\n")
    }
}

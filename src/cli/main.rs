//! CLI binary entry point for bola-loader

use std::path::PathBuf;
use std::process::ExitCode;

use bola_loader::cli::commands::config::handle_config_init;
use bola_loader::cli::commands::import::{ImportArgs, handle_import};
use bola_loader::cli::commands::report::{
    OutputFormat, QueryArgs, ReportArgs, handle_query, handle_report, list_reports,
};
use bola_loader::cli::commands::tables::handle_tables;
use bola_loader::cli::error::CliError;
use bola_loader::database::ReportParams;
use bola_loader::loader::TypeStrategy;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bola-loader")]
#[command(about = "Load football statistics CSV extracts into Supabase")]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the CSV extracts into the staging tables
    Import {
        /// Settings file (default: ./.bola-loader.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory holding the CSV files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Rows read from a file at a time
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Rows sent per insert request
        #[arg(long)]
        batch_size: Option<usize>,
        /// Only import these tables (repeatable)
        #[arg(short, long = "table")]
        tables: Vec<String>,
        /// How column types are decided
        #[arg(long, value_enum)]
        types: Option<TypesArg>,
        /// Read and clean the files without sending anything
        #[arg(long)]
        dry_run: bool,
        /// Summary format
        #[arg(short, long, value_enum, default_value = "table")]
        format: FormatArg,
    },
    /// List the configured tables and their source files
    Tables {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Manage the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Run a named report against the reporting database
    Report {
        /// Report name; omit to list the available reports
        name: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// League id
        #[arg(short, long)]
        league: Option<i64>,
        /// Season (start year)
        #[arg(short, long)]
        season: Option<i64>,
        /// Row limit for ranked reports (default depends on the report)
        #[arg(long)]
        limit: Option<i64>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: FormatArg,
    },
    /// Run a single read-only SELECT against the reporting database
    Query {
        /// The SELECT statement
        sql: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: FormatArg,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a sample .bola-loader.toml
    Init {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TypesArg {
    Sample,
    PerChunk,
}

impl From<TypesArg> for TypeStrategy {
    fn from(arg: TypesArg) -> Self {
        match arg {
            TypesArg::Sample => TypeStrategy::Sample,
            TypesArg::PerChunk => TypeStrategy::PerChunk,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Table,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Import {
            config,
            data_dir,
            chunk_size,
            batch_size,
            tables,
            types,
            dry_run,
            format,
        } => {
            let args = ImportArgs {
                config,
                data_dir,
                chunk_size,
                batch_size,
                tables,
                types: types.map(TypeStrategy::from),
                dry_run,
                format: format.into(),
            };
            handle_import(&args).map(|_| ())
        }
        Commands::Tables { config } => handle_tables(config.as_deref()),
        Commands::Config {
            command: ConfigCommands::Init { path, force },
        } => handle_config_init(&path, force).map(|_| ()),
        Commands::Report {
            name: None, ..
        } => {
            println!("{}", list_reports());
            Ok(())
        }
        Commands::Report {
            name: Some(report),
            config,
            league,
            season,
            limit,
            format,
        } => handle_report(&ReportArgs {
            config,
            report,
            params: ReportParams {
                league_id: league,
                season,
                limit,
            },
            format: format.into(),
        }),
        Commands::Query {
            sql,
            config,
            format,
        } => handle_query(&QueryArgs {
            config,
            sql,
            format: format.into(),
        }),
    }
}

//! Report and query commands: run named or ad-hoc read-only queries
//!
//! Reads from the reporting database configured under `[postgres]`.

use std::path::PathBuf;
use std::str::FromStr;

use crate::cli::error::CliError;
use crate::database::{QueryResult, ReportParams, ReportQuery, ReportScope};

/// Output format for report results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}. Use table or json.", s)),
        }
    }
}

/// Report command arguments
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub config: Option<PathBuf>,
    /// Report name, see [`list_reports`]
    pub report: String,
    pub params: ReportParams,
    pub format: OutputFormat,
}

/// Ad-hoc query arguments
#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub config: Option<PathBuf>,
    /// A single SELECT statement
    pub sql: String,
    pub format: OutputFormat,
}

/// Catalog listing
pub fn list_reports() -> String {
    ReportQuery::all()
        .iter()
        .map(|report| {
            let scope = match report.scope() {
                ReportScope::Global => "",
                ReportScope::Season => " (--league, --season)",
                ReportScope::Filtered => " ([--league], [--season])",
                ReportScope::League => " ([--league])",
            };
            let limit = report
                .default_limit()
                .map(|n| format!(" [--limit, default {}]", n))
                .unwrap_or_default();
            format!("{:22} {}{}{}", report.name(), report.description(), scope, limit)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a result in the requested format
pub fn format_result(result: &QueryResult, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(result.to_table()),
        OutputFormat::Json => serde_json::to_string_pretty(&result.rows)
            .map_err(|e| CliError::IoError(format!("Failed to serialize result: {}", e))),
    }
}

#[cfg(feature = "postgres-backend")]
fn reporting_connection(
    config_path: Option<&std::path::Path>,
) -> Result<(String, std::time::Duration), CliError> {
    use crate::cli::commands::load_config;
    use crate::config::ENV_POSTGRES_URL;

    let config = load_config(config_path)?;
    let conn_str = config.postgres.connection_string.clone().ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "PostgreSQL connection string not configured (set {} or [postgres].connection_string)",
            ENV_POSTGRES_URL
        ))
    })?;
    Ok((
        conn_str,
        std::time::Duration::from_secs(config.postgres.cache_ttl_secs),
    ))
}

#[cfg(feature = "postgres-backend")]
fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::IoError(format!("Failed to create runtime: {}", e)))
}

#[cfg(feature = "postgres-backend")]
fn print_result(result: &QueryResult, format: OutputFormat) -> Result<(), CliError> {
    println!("{}", format_result(result, format)?);
    if format != OutputFormat::Json {
        eprintln!(
            "\n{} rows, execution time: {}ms",
            result.row_count(),
            result.execution_time_ms
        );
    }
    Ok(())
}

/// Run a report against PostgreSQL
#[cfg(feature = "postgres-backend")]
pub fn handle_report(args: &ReportArgs) -> Result<(), CliError> {
    use crate::database::{CachedExecutor, PostgresExecutor};

    let report: ReportQuery = args.report.parse()?;
    // Fail on missing parameters before connecting
    report.params(&args.params)?;

    let (conn_str, ttl) = reporting_connection(args.config.as_deref())?;
    runtime()?.block_on(async {
        let backend = PostgresExecutor::connect(&conn_str).await?;
        let executor = CachedExecutor::with_ttl(backend, ttl);

        let result = report.run(&executor, &args.params).await?;
        print_result(&result, args.format)?;
        Ok::<(), CliError>(())
    })
}

/// Run an ad-hoc SELECT against PostgreSQL
#[cfg(feature = "postgres-backend")]
pub fn handle_query(args: &QueryArgs) -> Result<(), CliError> {
    use crate::database::{PostgresExecutor, read_only_select, run_select};

    read_only_select(&args.sql)?;

    let (conn_str, _) = reporting_connection(args.config.as_deref())?;
    runtime()?.block_on(async {
        let executor = PostgresExecutor::connect(&conn_str).await?;
        let result = run_select(&executor, &args.sql).await?;
        print_result(&result, args.format)?;
        Ok::<(), CliError>(())
    })
}

#[cfg(not(feature = "postgres-backend"))]
pub fn handle_report(args: &ReportArgs) -> Result<(), CliError> {
    args.report.parse::<ReportQuery>()?.params(&args.params)?;
    Err(not_compiled_in())
}

#[cfg(not(feature = "postgres-backend"))]
pub fn handle_query(args: &QueryArgs) -> Result<(), CliError> {
    crate::database::read_only_select(&args.sql)?;
    Err(not_compiled_in())
}

#[cfg(not(feature = "postgres-backend"))]
fn not_compiled_in() -> CliError {
    CliError::InvalidArgument(
        "PostgreSQL support not compiled in. Rebuild with --features cli-full".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_list_reports_marks_scoped_reports() {
        let listing = list_reports();
        assert_eq!(listing.lines().count(), ReportQuery::all().len());
        assert!(listing.contains("top-scorers"));
        assert!(
            listing
                .lines()
                .any(|l| l.starts_with("league-standings") && l.ends_with("(--league, --season)"))
        );
    }

    #[test]
    fn test_list_reports_shows_optional_filters_and_limits() {
        let listing = list_reports();
        let games = listing.lines().find(|l| l.starts_with("games ")).unwrap();
        assert!(games.ends_with("([--league], [--season]) [--limit, default 100]"));
        let nationalities = listing
            .lines()
            .find(|l| l.starts_with("player-nationalities"))
            .unwrap();
        assert!(nationalities.ends_with("[--limit, default 30]"));
        assert!(listing.lines().any(|l| l.starts_with("schema ")));
    }

    #[test]
    fn test_query_refuses_non_select_before_connecting() {
        let args = QueryArgs {
            config: None,
            sql: "DROP TABLE games".to_string(),
            format: OutputFormat::Table,
        };
        assert!(matches!(handle_query(&args), Err(CliError::Database(_))));
    }

    #[test]
    fn test_report_validates_parameters_before_connecting() {
        let args = ReportArgs {
            config: None,
            report: "league-standings".to_string(),
            params: ReportParams::default(),
            format: OutputFormat::Table,
        };
        assert!(matches!(handle_report(&args), Err(CliError::Database(_))));
    }

    #[test]
    fn test_format_result_json() {
        let result = QueryResult::new(
            vec!["season".to_string()],
            vec![json!({"season": 2020}), json!({"season": 2019})],
        );
        let out = format_result(&result, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!([{"season": 2020}, {"season": 2019}]));
    }
}

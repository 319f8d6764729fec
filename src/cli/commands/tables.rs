//! Tables command: show the configured table mapping

use std::fmt::Write;
use std::path::Path;

use crate::cli::commands::load_config;
use crate::cli::error::CliError;
use crate::loader::SourceMapping;

/// Print the mapping that an import would use
pub fn handle_tables(config: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config)?;
    print!("{}", describe_mapping(&config.mapping(), &config.import.data_dir));
    Ok(())
}

/// Human-readable listing of tables, source files and columns
pub fn describe_mapping(mapping: &SourceMapping, data_dir: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Data directory: {}", data_dir.display());
    for source in &mapping.tables {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", source.name);
        let _ = writeln!(out, "  file:     {}", source.file.display());
        if let Some(fallback) = &source.fallback {
            let _ = writeln!(out, "  fallback: {}", fallback.display());
        }
        let _ = writeln!(
            out,
            "  columns:  {} ({})",
            source.columns.len(),
            source.columns.join(", ")
        );
        for (column, column_type) in &source.types {
            let _ = writeln!(out, "  type:     {} = {}", column, column_type);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_football_mapping() {
        let listing = describe_mapping(&SourceMapping::football(), Path::new("data"));
        assert!(listing.starts_with("Data directory: data\n"));
        assert!(listing.contains("players_temp\n  file:     players_utf8.csv\n  fallback: players.csv"));
        assert!(listing.contains("  columns:  2 (teamID, name)"));
    }
}

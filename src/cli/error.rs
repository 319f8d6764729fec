//! CLI-specific error types

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::database::DatabaseError;
use crate::loader::{LoaderError, StoreError};

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error(
        "Missing required settings: {}\n\nYou can:\n  1. Set them as environment variables\n  2. Create a .env file with these variables\n  3. Add them to the [supabase] section of .bola-loader.toml",
        .0.join(", ")
    )]
    MissingCredentials(Vec<&'static str>),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Import failed: {0}")]
    Loader(#[from] LoaderError),

    #[error("Failed to create Supabase client: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("File already exists: {0} (use --force to overwrite)")]
    FileExists(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl CliError {
    /// Lift missing credentials out of a config error
    pub fn from_config(error: ConfigError) -> Self {
        match error {
            ConfigError::MissingCredentials(missing) => CliError::MissingCredentials(missing),
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_lists_names() {
        let error = CliError::from_config(ConfigError::MissingCredentials(vec![
            "SUPABASE_URL",
            "SUPABASE_SERVICE_ROLE_KEY",
        ]));
        let message = error.to_string();
        assert!(message.starts_with(
            "Missing required settings: SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY"
        ));
        assert!(message.contains(".env file"));
    }

    #[test]
    fn test_other_config_errors_pass_through() {
        let error = CliError::from_config(ConfigError::Parse("bad".to_string()));
        assert!(matches!(error, CliError::Config(ConfigError::Parse(_))));
    }
}

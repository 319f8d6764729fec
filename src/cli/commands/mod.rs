//! CLI command implementations

pub mod config;
pub mod import;
pub mod report;
pub mod tables;

use std::path::{Path, PathBuf};

use crate::cli::error::CliError;
use crate::config::{CONFIG_FILENAME, LoaderConfig, load_dotenv};

/// Load `.env`, then the settings file (default `.bola-loader.toml`)
pub fn load_config(path: Option<&Path>) -> Result<LoaderConfig, CliError> {
    load_dotenv();
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    Ok(LoaderConfig::load(&path)?)
}

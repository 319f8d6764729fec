//! Config command: write a starter settings file

use std::path::{Path, PathBuf};

use crate::cli::error::CliError;
use crate::config::{CONFIG_FILENAME, sample_config};

/// Write the sample settings file into `dir`, returning its path
pub fn handle_config_init(dir: &Path, force: bool) -> Result<PathBuf, CliError> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() && !force {
        return Err(CliError::FileExists(path));
    }

    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::IoError(format!("Failed to create {}: {}", dir.display(), e)))?;
    std::fs::write(&path, sample_config())
        .map_err(|e| CliError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;

    println!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempdir().unwrap();
        let path = handle_config_init(dir.path(), false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let config = LoaderConfig::parse(&content).unwrap();
        assert_eq!(config.import.batch_size, 1000);
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "# mine").unwrap();

        assert!(matches!(
            handle_config_init(dir.path(), false),
            Err(CliError::FileExists(_))
        ));
        assert!(handle_config_init(dir.path(), true).is_ok());
    }
}

//! Settings file round trips

use bola_loader::config::{CONFIG_FILENAME, LoaderConfig, sample_config};
use bola_loader::loader::{ColumnType, TableSource, TypeStrategy};
use tempfile::TempDir;

#[test]
fn test_save_and_reload_custom_mapping() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);

    let mut config = LoaderConfig::new();
    config.import.chunk_size = 250;
    config.import.types = TypeStrategy::PerChunk;
    config.tables = vec![
        TableSource::new("shots_temp", "shots.csv", &["gameID", "xGoal"])
            .with_type("xGoal", ColumnType::Decimal),
    ];
    config.save(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let reloaded = LoaderConfig::parse(&content).unwrap();
    assert_eq!(reloaded.import.chunk_size, 250);
    assert_eq!(reloaded.import.types, TypeStrategy::PerChunk);

    let mapping = reloaded.mapping();
    assert_eq!(mapping.len(), 1);
    assert_eq!(
        mapping.get("shots_temp").unwrap().types.get("xGoal"),
        Some(&ColumnType::Decimal)
    );
}

#[test]
fn test_sample_config_uses_football_mapping() {
    let config = LoaderConfig::parse(sample_config()).unwrap();
    assert!(config.tables.is_empty());
    assert_eq!(config.mapping().len(), 7);
    assert_eq!(config.import_settings().chunk_size, 5000);
}

#[test]
fn test_overrides_fill_credentials() {
    let mut config = LoaderConfig::parse(sample_config()).unwrap();
    assert!(config.credentials().is_err());

    config.apply_overrides(|key| match key {
        "SUPABASE_URL" => Some("https://abcd.supabase.co".to_string()),
        "SUPABASE_SERVICE_ROLE_KEY" => Some("service-key".to_string()),
        "BOLA_BATCH_SIZE" => Some("500".to_string()),
        _ => None,
    });

    let credentials = config.credentials().unwrap();
    assert_eq!(credentials.url, "https://abcd.supabase.co");
    assert_eq!(config.import.batch_size, 500);
}

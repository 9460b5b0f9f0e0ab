//! Loading `trellis.toml` from disk

use std::fs;
use tempfile::TempDir;
use trellis_core::{Blueprint, Error};
use trellis_engine::{Configuration, Creatable, Fetchable, Inventory, CONFIG_FILE_NAME};
use trellis_storage::MemoryBackend;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_from_file_reads_strategy_and_settings() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
feed_id_strategy = "uuid"

[implementation]
"storage.path" = "/var/lib/trellis"
"#,
    );
    let config = Configuration::from_file(&path).unwrap();
    assert_eq!(
        config.property("storage.path", None).as_deref(),
        Some("/var/lib/trellis")
    );

    let inventory = Inventory::with_configuration(MemoryBackend::new(), config);
    let tenant = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
    let feed = tenant.feeds().create(Blueprint::feed("")).unwrap();
    let id = feed.entity().unwrap().path.id().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
}

#[test]
fn test_empty_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let config = Configuration::from_file(&path).unwrap();
    assert!(config.implementation_config().is_empty());
    assert!(config.result_filter().is_none());

    let inventory = Inventory::with_configuration(MemoryBackend::new(), config);
    let tenant = inventory.tenants().create(Blueprint::tenant("t")).unwrap();
    let result = tenant.feeds().create(Blueprint::feed(""));
    assert!(matches!(result, Err(Error::InvalidPath { .. })));
}

#[test]
fn test_missing_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let result = Configuration::from_file(dir.path().join(CONFIG_FILE_NAME));
    assert!(matches!(result, Err(Error::Configuration { .. })));
}

#[test]
fn test_malformed_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "feed_id_strategy = [");
    assert!(matches!(
        Configuration::from_file(&path),
        Err(Error::Configuration { .. })
    ));
}

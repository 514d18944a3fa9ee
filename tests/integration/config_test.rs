use std::fs;
use std::time::Duration;

use hwpulse::core::config::{MonitorConfig, DEFAULT_SHARED_MEMORY_NAME};
use hwpulse::TelemetryError;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = MonitorConfig::default();
    assert_eq!(config.poll_interval(), Duration::from_millis(1000));
    assert!(config.enable_instrumentation);
    assert!(config.enable_vendor_gpu);
    assert!(config.enable_shared_memory);
    assert_eq!(config.shared_memory_name, DEFAULT_SHARED_MEMORY_NAME);
    assert_eq!(config.instrumentation_namespaces.len(), 2);
}

#[test]
fn test_load_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hwpulse.json");
    fs::write(
        &path,
        r#"{
            "poll_interval_ms": 250,
            "enable_vendor_gpu": false,
            "instrumentation_namespaces": ["root\\LibreHardwareMonitor"]
        }"#,
    )
    .unwrap();

    let config = MonitorConfig::load(Some(&path));
    assert_eq!(config.poll_interval(), Duration::from_millis(250));
    assert!(!config.enable_vendor_gpu);
    assert!(config.enable_shared_memory);
    assert_eq!(config.instrumentation_namespaces, vec!["root\\LibreHardwareMonitor"]);
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ poll_interval_ms: ").unwrap();

    assert!(matches!(
        MonitorConfig::from_file(&path),
        Err(TelemetryError::Json(_))
    ));
    assert_eq!(MonitorConfig::load(Some(&path)), MonitorConfig::default());
}

#[test]
fn test_missing_explicit_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.json");
    assert_eq!(MonitorConfig::load(Some(&path)), MonitorConfig::default());
}

#[test]
fn test_empty_shared_memory_name_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hwpulse.json");
    fs::write(&path, r#"{"shared_memory_name": "  "}"#).unwrap();

    assert!(matches!(
        MonitorConfig::from_file(&path),
        Err(TelemetryError::Config(_))
    ));
}

#[test]
fn test_empty_file_is_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.json");
    fs::write(&path, "").unwrap();
    assert_eq!(MonitorConfig::from_file(&path).unwrap(), MonitorConfig::default());
}

//! Installs the global subscriber, so it lives in its own test binary.

use smrt_telemetry::{init_logging, LogConfig, TelemetryError};

#[test]
fn test_log_file_receives_records_and_second_init_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lamp.log");
    std::fs::write(&path, "previous run\n").unwrap();

    let config = LogConfig {
        level: "info".to_string(),
        file: Some(path.clone()),
        ..LogConfig::default()
    };
    init_logging(&config).unwrap();

    tracing::info!(lamp = "kitchen", "lamp switched on");
    tracing::debug!("below the configured level");

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("previous run\n"));
    assert!(contents.contains("lamp switched on"));
    assert!(contents.contains("kitchen"));
    assert!(!contents.contains("below the configured level"));

    let again = init_logging(&LogConfig::default());
    assert!(matches!(again, Err(TelemetryError::LoggingInit(_))));
}

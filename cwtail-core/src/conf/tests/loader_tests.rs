use crate::conf::{ConfigError, CwtailConfig, load_config, load_or_default};
use crate::tail::FilterSyntax;
use crate::tail::backoff::BackoffConfig;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn empty_file_yields_defaults() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("cwtail.hcl");
    fs::write(&path, "").unwrap();

    // Act
    let config = load_config(&path).unwrap();

    // Assert
    assert_eq!(config, CwtailConfig::default());
    assert_eq!(config.tail_settings(), crate::tail::TailSettings::default());
}

#[test]
fn parses_every_section() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("cwtail.hcl");
    fs::write(
        &path,
        r#"
tail = {
  poll_interval_ms     = 250
  page_budget          = 2
  page_size            = 500
  refresh_every_cycles = 10
  cancel_grace_ms      = 100
  filter_syntax        = "regex"
}

throttle_backoff = {
  initial_delay_ms = 500
  max_delay_ms     = 20000
  multiplier       = 3.0
}

unavailable_retry = {
  max_retries = 1
}

store = {
  path      = "/var/lib/cwtail/store.json"
  page_size = 10
}
"#,
    )
    .unwrap();

    // Act
    let config = load_config(&path).unwrap();
    let settings = config.tail_settings();

    // Assert
    assert_eq!(config.tail.filter_syntax, FilterSyntax::Regex);
    assert_eq!(config.store.path, PathBuf::from("/var/lib/cwtail/store.json"));
    assert_eq!(config.store.page_size, 10);

    assert_eq!(settings.poll_interval, Duration::from_millis(250));
    assert_eq!(settings.page_budget, 2);
    assert_eq!(settings.page_size, Some(500));
    assert_eq!(settings.refresh_every_cycles, 10);
    assert_eq!(settings.cancel_grace, Duration::from_millis(100));

    assert_eq!(settings.throttle_backoff.initial_delay, Duration::from_millis(500));
    assert_eq!(settings.throttle_backoff.max_delay, Duration::from_secs(20));
    assert_eq!(settings.throttle_backoff.backoff_multiplier, 3.0);
    assert_eq!(
        settings.throttle_backoff.max_retries,
        BackoffConfig::THROTTLE.max_retries
    );

    assert_eq!(settings.unavailable_retry.max_retries, 1);
    assert_eq!(
        settings.unavailable_retry.initial_delay,
        BackoffConfig::UNAVAILABLE.initial_delay
    );
}

#[test]
fn block_syntax_is_accepted() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("cwtail.hcl");
    fs::write(&path, "tail {\n  page_budget = 7\n}\n").unwrap();

    // Act
    let config = load_config(&path).unwrap();

    // Assert
    assert_eq!(config.tail.page_budget, 7);
}

#[test]
fn unknown_fields_are_rejected() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("cwtail.hcl");
    fs::write(&path, "tail = { poll_interval = 5 }\n").unwrap();

    // Act
    let err = load_config(&path).unwrap_err();

    // Assert
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn malformed_hcl_is_a_parse_error() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("cwtail.hcl");
    fs::write(&path, "tail = {\n").unwrap();

    // Act
    let err = load_config(&path).unwrap_err();

    // Assert
    match err {
        ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected Parse, got {other:?}"),
    }
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempdir().unwrap();

    let err = load_config(&dir.path().join("nope.hcl")).unwrap_err();

    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn load_or_default_tolerates_a_missing_file() {
    let dir = tempdir().unwrap();

    let config = load_or_default(&dir.path().join("nope.hcl")).unwrap();

    assert_eq!(config, CwtailConfig::default());
}

#[test]
fn load_or_default_still_reports_bad_files() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("cwtail.hcl");
    fs::write(&path, "tail = { page_budget = 0 }\n").unwrap();

    // Act
    let err = load_or_default(&path).unwrap_err();

    // Assert
    assert!(matches!(err, ConfigError::Validation { .. }));
}

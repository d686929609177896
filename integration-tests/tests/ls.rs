use cwtail_core::backend::FileBackend;
use cwtail_core::cli::CliContext;
use cwtail_core::list::Lister;
use cwtail_core::tail::TailError;
use integration_tests::harness::TestStore;
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;

#[tokio::test]
async fn lists_groups_and_streams_from_a_store_file() {
    // Arrange
    let mut store = TestStore::new();
    store
        .create_stream("prod/web", "web-2")
        .create_stream("prod/web", "web-1")
        .create_stream("dev/web", "web-1");
    let lister = Lister::new(Arc::new(store.backend()));

    // Act
    let groups = lister.groups(None).collect_all().await.unwrap();
    let prod = lister
        .groups(Some("prod/".to_string()))
        .collect_all()
        .await
        .unwrap();
    let streams = lister.streams("prod/web").collect_all().await.unwrap();

    // Assert
    assert_eq!(groups, vec!["dev/web", "prod/web"]);
    assert_eq!(prod, vec!["prod/web"]);
    assert_eq!(streams, vec!["web-1", "web-2"]);
}

#[tokio::test]
async fn unreadable_store_is_reported_as_unavailable() {
    // Arrange
    let store = TestStore::new();
    fs::write(store.path(), "{ not json").unwrap();
    let lister = Lister::new(Arc::new(FileBackend::new(store.path())));

    // Act
    let err = lister.groups(None).collect_all().await.unwrap_err();

    // Assert
    assert!(matches!(err, TailError::BackendUnavailable { .. }));
}

#[test]
fn store_flag_overrides_configured_path() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("cwtail.hcl");
    fs::write(&config, "store = { path = \"configured.json\" }\n").unwrap();

    // Act
    let configured = CliContext::load(Some(config.as_path()), None).unwrap();
    let overridden = CliContext::load(Some(config.as_path()), Some(dir.path().join("flag.json"))).unwrap();

    // Assert
    assert_eq!(configured.store_path, std::path::PathBuf::from("configured.json"));
    assert_eq!(overridden.store_path, dir.path().join("flag.json"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = CliContext::load(Some(dir.path().join("missing.hcl").as_path()), None);

    assert!(result.is_err());
}

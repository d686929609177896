use cwtail_core::backend::{FileBackend, FixtureEvent, StoreFixture};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A JSON store file in a temporary directory, rewritten on every change.
pub struct TestStore {
    _dir: TempDir,
    path: PathBuf,
    fixture: StoreFixture,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("store.json");
        let store = Self {
            _dir: dir,
            path,
            fixture: StoreFixture::default(),
        };
        store.write();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend(&self) -> FileBackend {
        FileBackend::new(&self.path)
    }

    pub fn create_stream(&mut self, group: &str, stream: &str) -> &mut Self {
        self.fixture
            .groups
            .entry(group.to_string())
            .or_default()
            .entry(stream.to_string())
            .or_default();
        self.write();
        self
    }

    pub fn push(&mut self, group: &str, stream: &str, timestamp: i64, message: &str) -> &mut Self {
        self.fixture
            .groups
            .entry(group.to_string())
            .or_default()
            .entry(stream.to_string())
            .or_default()
            .push(FixtureEvent {
                timestamp,
                message: message.to_string(),
                id: None,
            });
        self.write();
        self
    }

    fn write(&self) {
        let json = serde_json::to_string_pretty(&self.fixture).expect("fixture serializes");
        std::fs::write(&self.path, json).expect("failed to write store file");
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

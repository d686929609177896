use crate::backend::memory::{DEFAULT_EVENT_PAGE_SIZE, DEFAULT_LIST_PAGE_SIZE};
use crate::backend::{
    BackendError, EventPage, EventQuery, ListGroupsRequest, ListStreamsRequest, LogBackend,
    MemoryBackend, Page,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// On-disk shape of a JSON log store.
///
/// ```json
/// { "groups": { "app": { "web-1": [ { "timestamp": 1700000000000, "message": "hi" } ] } } }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub groups: BTreeMap<String, BTreeMap<String, Vec<FixtureEvent>>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixtureEvent {
    pub timestamp: i64,
    pub message: String,

    /// Generated from the timestamp and position in the stream when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl StoreFixture {
    pub fn into_backend(self, list_page_size: usize, event_page_size: usize) -> MemoryBackend {
        let backend = MemoryBackend::with_page_sizes(list_page_size, event_page_size);
        for (group, streams) in self.groups {
            backend.create_group(&group);
            for (stream, events) in streams {
                backend.create_stream(&group, &stream);
                for (position, event) in events.into_iter().enumerate() {
                    let id = event
                        .id
                        .unwrap_or_else(|| format!("{:020}{position:010}", event.timestamp));
                    backend.push_event_with_id(&group, &stream, &id, event.timestamp, &event.message);
                }
            }
        }
        backend
    }
}

struct Snapshot {
    modified: SystemTime,
    len: u64,
    backend: Arc<MemoryBackend>,
}

/// Log store backed by a JSON file, reloaded whenever the file changes.
///
/// Appending events to a stream in the file makes them visible to a running
/// follow session on its next poll.
pub struct FileBackend {
    path: PathBuf,
    list_page_size: usize,
    event_page_size: usize,
    snapshot: Mutex<Option<Snapshot>>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_page_sizes(path, DEFAULT_LIST_PAGE_SIZE, DEFAULT_EVENT_PAGE_SIZE)
    }

    pub fn with_page_sizes(
        path: impl Into<PathBuf>,
        list_page_size: usize,
        event_page_size: usize,
    ) -> Self {
        Self {
            path: path.into(),
            list_page_size,
            event_page_size,
            snapshot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cached(&self, modified: SystemTime, len: u64) -> Option<Arc<MemoryBackend>> {
        let snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        snapshot
            .as_ref()
            .filter(|s| s.modified == modified && s.len == len)
            .map(|s| s.backend.clone())
    }

    async fn current(&self) -> Result<Arc<MemoryBackend>, BackendError> {
        let meta = tokio::fs::metadata(&self.path).await.map_err(|e| {
            BackendError::unavailable(format!("cannot stat {}: {e}", self.path.display()))
        })?;
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let len = meta.len();

        if let Some(backend) = self.cached(modified, len) {
            return Ok(backend);
        }

        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BackendError::unavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let fixture: StoreFixture = serde_json::from_str(&raw).map_err(|e| {
            BackendError::unavailable(format!("invalid store {}: {e}", self.path.display()))
        })?;

        let backend = Arc::new(fixture.into_backend(self.list_page_size, self.event_page_size));
        tracing::debug!(path = %self.path.display(), len, "store reloaded");

        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(Snapshot {
            modified,
            len,
            backend: backend.clone(),
        });

        Ok(backend)
    }
}

#[async_trait]
impl LogBackend for FileBackend {
    async fn list_groups(&self, request: ListGroupsRequest) -> Result<Page<String>, BackendError> {
        self.current().await?.list_groups(request).await
    }

    async fn list_streams(
        &self,
        request: ListStreamsRequest,
    ) -> Result<Page<String>, BackendError> {
        self.current().await?.list_streams(request).await
    }

    async fn fetch_events(&self, query: EventQuery) -> Result<EventPage, BackendError> {
        self.current().await?.fetch_events(query).await
    }
}

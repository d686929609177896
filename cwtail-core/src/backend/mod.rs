//! Backend seam.
//!
//! The tailing engine talks to exactly one kind of log store through the
//! [`LogBackend`] trait: paginated group/stream listings and paginated event
//! queries. Transport details live behind the trait.

mod error;
mod file;
mod memory;


pub use error::BackendError;
pub use file::{FileBackend, FixtureEvent, StoreFixture};
pub use memory::{DEFAULT_EVENT_PAGE_SIZE, DEFAULT_LIST_PAGE_SIZE, FetchCounters, MemoryBackend};

use crate::model::PageToken;
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct ListGroupsRequest {
    pub prefix: Option<String>,
    pub token: Option<PageToken>,
}

#[derive(Debug, Clone)]
pub struct ListStreamsRequest {
    pub group: String,
    pub prefix: Option<String>,
    pub token: Option<PageToken>,
}

/// One page worth of event query.
///
/// `streams` names a single stream for per-stream polling; several streams
/// (or none, meaning the whole group) make it a group-level query.
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub group: String,
    pub streams: Vec<String>,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub token: Option<PageToken>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<PageToken>,
}

/// Event as returned on the wire, before it is tagged with its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub id: String,
    pub timestamp_ms: i64,
    pub message: String,
    pub stream: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub next_token: Option<PageToken>,
}

#[async_trait]
pub trait LogBackend: Send + Sync + 'static {
    async fn list_groups(&self, request: ListGroupsRequest) -> Result<Page<String>, BackendError>;

    async fn list_streams(&self, request: ListStreamsRequest)
    -> Result<Page<String>, BackendError>;

    /// Events come back ordered by timestamp within each stream.
    async fn fetch_events(&self, query: EventQuery) -> Result<EventPage, BackendError>;
}

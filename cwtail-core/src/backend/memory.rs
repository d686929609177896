use crate::backend::{
    BackendError, EventPage, EventQuery, ListGroupsRequest, ListStreamsRequest, LogBackend, Page,
    RawEvent,
};
use crate::model::PageToken;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_LIST_PAGE_SIZE: usize = 50;
pub const DEFAULT_EVENT_PAGE_SIZE: usize = 100;

const TOKEN_SEPARATOR: char = '\u{1f}';

/// Call counters, handy for asserting on pacing in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchCounters {
    pub list_groups: usize,
    pub list_streams: usize,
    pub fetch_events: usize,
    pub fetch_by_stream: BTreeMap<String, usize>,
}

#[derive(Default)]
struct Store {
    groups: BTreeMap<String, BTreeMap<String, Vec<RawEvent>>>,
    fetch_faults: HashMap<String, VecDeque<BackendError>>,
    listing_faults: VecDeque<BackendError>,
    counters: FetchCounters,
    next_seq: u64,
}

/// In-process log store.
///
/// Streams keep their events sorted by `(timestamp, id)`. Page tokens encode
/// the last key handed out, so appending events between pages never shifts
/// a pagination cursor.
pub struct MemoryBackend {
    store: Mutex<Store>,
    list_page_size: usize,
    event_page_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_page_sizes(DEFAULT_LIST_PAGE_SIZE, DEFAULT_EVENT_PAGE_SIZE)
    }

    pub fn with_page_sizes(list_page_size: usize, event_page_size: usize) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            list_page_size: list_page_size.max(1),
            event_page_size: event_page_size.max(1),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // A poisoned store only means a test panicked mid-mutation.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create_group(&self, group: &str) {
        self.store().groups.entry(group.to_string()).or_default();
    }

    pub fn create_stream(&self, group: &str, stream: &str) {
        self.store()
            .groups
            .entry(group.to_string())
            .or_default()
            .entry(stream.to_string())
            .or_default();
    }

    pub fn delete_stream(&self, group: &str, stream: &str) {
        if let Some(streams) = self.store().groups.get_mut(group) {
            streams.remove(stream);
        }
    }

    /// Appends an event and returns its generated id.
    pub fn push_event(&self, group: &str, stream: &str, timestamp_ms: i64, message: &str) -> String {
        let mut store = self.store();
        store.next_seq += 1;
        let id = generated_id(timestamp_ms, store.next_seq);
        insert_event(&mut store, group, stream, id.clone(), timestamp_ms, message);
        id
    }

    pub fn push_event_with_id(
        &self,
        group: &str,
        stream: &str,
        id: &str,
        timestamp_ms: i64,
        message: &str,
    ) {
        let mut store = self.store();
        insert_event(&mut store, group, stream, id.to_string(), timestamp_ms, message);
    }

    /// Queues a failure for the next fetch touching `stream`.
    pub fn inject_fault(&self, stream: &str, error: BackendError) {
        self.store()
            .fetch_faults
            .entry(stream.to_string())
            .or_default()
            .push_back(error);
    }

    /// Queues a failure for the next stream or group listing call.
    pub fn inject_listing_fault(&self, error: BackendError) {
        self.store().listing_faults.push_back(error);
    }

    pub fn counters(&self) -> FetchCounters {
        self.store().counters.clone()
    }

    fn list_names<'a>(
        &self,
        names: impl Iterator<Item = &'a String>,
        prefix: Option<&str>,
        token: Option<&PageToken>,
    ) -> Page<String> {
        let mut matching = names
            .filter(|name| prefix.is_none_or(|p| name.starts_with(p)))
            .filter(|name| token.is_none_or(|t| name.as_str() > t.0.as_str()));

        let items: Vec<String> = matching.by_ref().take(self.list_page_size).cloned().collect();
        let next_token = match (matching.next(), items.last()) {
            (Some(_), Some(last)) => Some(PageToken(last.clone())),
            _ => None,
        };

        Page { items, next_token }
    }
}

fn generated_id(timestamp_ms: i64, seq: u64) -> String {
    format!("{timestamp_ms:020}{seq:010}")
}

fn insert_event(
    store: &mut Store,
    group: &str,
    stream: &str,
    id: String,
    timestamp_ms: i64,
    message: &str,
) {
    let events = store
        .groups
        .entry(group.to_string())
        .or_default()
        .entry(stream.to_string())
        .or_default();

    let event = RawEvent {
        id,
        timestamp_ms,
        message: message.to_string(),
        stream: stream.to_string(),
    };
    let at = events.partition_point(|e| (e.timestamp_ms, &e.id) <= (timestamp_ms, &event.id));
    events.insert(at, event);
}

fn encode_token(event: &RawEvent) -> PageToken {
    PageToken(format!(
        "{}{TOKEN_SEPARATOR}{}{TOKEN_SEPARATOR}{}",
        event.timestamp_ms, event.stream, event.id
    ))
}

fn decode_token(token: &PageToken) -> Result<(i64, String, String), BackendError> {
    let mut parts = token.0.splitn(3, TOKEN_SEPARATOR);
    let (Some(ts), Some(stream), Some(id)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(BackendError::unavailable("malformed pagination token"));
    };
    let ts = ts
        .parse::<i64>()
        .map_err(|_| BackendError::unavailable("malformed pagination token"))?;
    Ok((ts, stream.to_string(), id.to_string()))
}

#[async_trait]
impl LogBackend for MemoryBackend {
    async fn list_groups(&self, request: ListGroupsRequest) -> Result<Page<String>, BackendError> {
        let mut store = self.store();
        store.counters.list_groups += 1;
        if let Some(fault) = store.listing_faults.pop_front() {
            return Err(fault);
        }

        Ok(self.list_names(
            store.groups.keys(),
            request.prefix.as_deref(),
            request.token.as_ref(),
        ))
    }

    async fn list_streams(
        &self,
        request: ListStreamsRequest,
    ) -> Result<Page<String>, BackendError> {
        let mut store = self.store();
        store.counters.list_streams += 1;
        if let Some(fault) = store.listing_faults.pop_front() {
            return Err(fault);
        }

        let streams = store
            .groups
            .get(&request.group)
            .ok_or_else(|| BackendError::GroupNotFound {
                group: request.group.clone(),
            })?;

        Ok(self.list_names(
            streams.keys(),
            request.prefix.as_deref(),
            request.token.as_ref(),
        ))
    }

    async fn fetch_events(&self, query: EventQuery) -> Result<EventPage, BackendError> {
        let mut store = self.store();
        store.counters.fetch_events += 1;

        let selected: Vec<String> = if query.streams.is_empty() {
            store
                .groups
                .get(&query.group)
                .map(|streams| streams.keys().cloned().collect())
                .unwrap_or_default()
        } else {
            query.streams.clone()
        };

        for stream in &selected {
            *store
                .counters
                .fetch_by_stream
                .entry(stream.clone())
                .or_default() += 1;
        }
        for stream in &selected {
            if let Some(fault) = store
                .fetch_faults
                .get_mut(stream)
                .and_then(VecDeque::pop_front)
            {
                return Err(fault);
            }
        }

        let streams = store
            .groups
            .get(&query.group)
            .ok_or_else(|| BackendError::GroupNotFound {
                group: query.group.clone(),
            })?;

        let after = query.token.as_ref().map(decode_token).transpose()?;

        let mut matching = Vec::new();
        for name in &selected {
            let events = streams
                .get(name)
                .ok_or_else(|| BackendError::StreamNotFound {
                    group: query.group.clone(),
                    stream: name.clone(),
                })?;

            matching.extend(events.iter().filter(|e| {
                query.start_ms.is_none_or(|start| e.timestamp_ms >= start)
                    && query.end_ms.is_none_or(|end| e.timestamp_ms < end)
                    && after.as_ref().is_none_or(|(ts, stream, id)| {
                        (e.timestamp_ms, &e.stream, &e.id) > (*ts, stream, id)
                    })
            }));
        }
        matching.sort_by(|a, b| {
            (a.timestamp_ms, &a.stream, &a.id).cmp(&(b.timestamp_ms, &b.stream, &b.id))
        });

        let limit = query
            .limit
            .map_or(self.event_page_size, |l| l.clamp(1, self.event_page_size));
        let events: Vec<RawEvent> = matching.iter().take(limit).map(|e| (*e).clone()).collect();
        let next_token = if matching.len() > limit {
            events.last().map(encode_token)
        } else {
            None
        };

        Ok(EventPage { events, next_token })
    }
}

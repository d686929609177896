use crate::backend::{
    BackendError, EventPage, EventQuery, ListGroupsRequest, ListStreamsRequest, LogBackend,
    MemoryBackend, Page,
};
use crate::model::{TimeWindow, from_millis};
use crate::tail::backoff::BackoffConfig;
use crate::tail::{
    CancelSignal, ManualClock, MergeScheduler, TailItem, TailRequest, TailSession, TailSettings,
    TailWarning,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) const GROUP: &str = "app";
pub(crate) const NOW_MS: i64 = 10_000;

/// Default settings with deterministic backoff.
pub(crate) fn test_settings() -> TailSettings {
    TailSettings {
        poll_interval: Duration::from_secs(1),
        refresh_every_cycles: 1,
        throttle_backoff: BackoffConfig {
            jitter: 0.0,
            ..BackoffConfig::THROTTLE
        },
        unavailable_retry: BackoffConfig {
            initial_delay: Duration::from_millis(10),
            ..BackoffConfig::UNAVAILABLE
        },
        ..TailSettings::default()
    }
}

pub(crate) struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<ManualClock>,
    pub settings: TailSettings,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(MemoryBackend::new())
    }

    pub fn with_backend(backend: MemoryBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            clock: Arc::new(ManualClock::new(from_millis(NOW_MS))),
            settings: test_settings(),
        }
    }

    pub fn scheduler(&self) -> MergeScheduler<MemoryBackend> {
        MergeScheduler::with_clock(
            self.backend.clone(),
            self.clock.clone(),
            self.settings.clone(),
        )
    }

    pub async fn open(&self, request: TailRequest) -> TailSession<MemoryBackend> {
        self.scheduler()
            .tail(request, CancelSignal::never())
            .await
            .expect("session should open")
    }

    pub fn set_now(&self, ms: i64) {
        self.clock.set(from_millis(ms));
    }
}

pub(crate) fn request(pattern: &str, follow: bool) -> TailRequest {
    TailRequest {
        follow,
        ..TailRequest::new(GROUP, pattern)
    }
}

/// Request covering all history up to `end_ms` (exclusive).
pub(crate) fn history(pattern: &str, start_ms: i64, end_ms: Option<i64>) -> TailRequest {
    TailRequest {
        window: TimeWindow::new(Some(from_millis(start_ms)), end_ms.map(from_millis)).unwrap(),
        ..TailRequest::new(GROUP, pattern)
    }
}

pub(crate) async fn drain<B: LogBackend>(session: &mut TailSession<B>) -> Vec<TailItem> {
    let mut items = Vec::new();
    while let Some(item) = session.next().await {
        items.push(item);
    }
    items
}

/// `(timestamp_ms, stream)` of every event, in output order.
pub(crate) fn event_keys(items: &[TailItem]) -> Vec<(i64, String)> {
    items
        .iter()
        .filter_map(|item| match item {
            TailItem::Event(e) => Some((e.timestamp.timestamp_millis(), e.stream.clone())),
            TailItem::Warning(_) => None,
        })
        .collect()
}

pub(crate) fn messages(items: &[TailItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            TailItem::Event(e) => Some(e.message.clone()),
            TailItem::Warning(_) => None,
        })
        .collect()
}

pub(crate) fn warnings(items: &[TailItem]) -> Vec<TailWarning> {
    items
        .iter()
        .filter_map(|item| match item {
            TailItem::Warning(w) => Some(w.clone()),
            TailItem::Event(_) => None,
        })
        .collect()
}

pub(crate) fn key(ms: i64, stream: &str) -> (i64, String) {
    (ms, stream.to_string())
}

/// How a [`FaultyBackend`] misbehaves. Counts are 1-based.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// The nth fetch of stream `s1` panics.
    PanicOnFetch(usize),

    /// Fetches of `s1` from the nth on never resolve.
    HangFromFetch(usize),

    /// Stream listings from the nth on never resolve.
    HangFromListing(usize),
}

/// A [`MemoryBackend`] that panics or hangs on selected calls.
pub(crate) struct FaultyBackend {
    pub inner: MemoryBackend,
    fault: Fault,
    s1_fetches: AtomicUsize,
    listings: AtomicUsize,
}

impl FaultyBackend {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: MemoryBackend::new(),
            fault,
            s1_fetches: AtomicUsize::new(0),
            listings: AtomicUsize::new(0),
        }
    }

    pub fn s1_fetches(&self) -> usize {
        self.s1_fetches.load(Ordering::SeqCst)
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogBackend for FaultyBackend {
    async fn list_groups(&self, request: ListGroupsRequest) -> Result<Page<String>, BackendError> {
        self.inner.list_groups(request).await
    }

    async fn list_streams(
        &self,
        request: ListStreamsRequest,
    ) -> Result<Page<String>, BackendError> {
        let call = self.listings.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(self.fault, Fault::HangFromListing(n) if call >= n) {
            std::future::pending::<()>().await;
        }
        self.inner.list_streams(request).await
    }

    async fn fetch_events(&self, query: EventQuery) -> Result<EventPage, BackendError> {
        if query.streams == ["s1"] {
            let call = self.s1_fetches.fetch_add(1, Ordering::SeqCst) + 1;
            match self.fault {
                Fault::PanicOnFetch(n) if call == n => panic!("fetch of s1 blew up"),
                Fault::HangFromFetch(n) if call >= n => std::future::pending::<()>().await,
                _ => {}
            }
        }
        self.inner.fetch_events(query).await
    }
}

/// Scheduler over `backend` with a manual clock at [`NOW_MS`].
pub(crate) fn faulty_scheduler(
    backend: Arc<FaultyBackend>,
    settings: TailSettings,
) -> MergeScheduler<FaultyBackend> {
    MergeScheduler::with_clock(
        backend,
        Arc::new(ManualClock::new(from_millis(NOW_MS))),
        settings,
    )
}

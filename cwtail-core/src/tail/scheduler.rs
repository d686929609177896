//! Merge scheduler
//!
//! A tail session runs in poll cycles. Each cycle fans out one worker per
//! stream, waits for all of them at a barrier, and only then merges what came
//! back. The backend gives no ordering across streams, so nothing can be
//! emitted before every stream has reported for the cycle.
//!
//! Emission is further gated by a watermark: the oldest *horizon* among the
//! active streams. A stream's horizon is the instant below which it has no
//! unfetched events. A throttled stream keeps its old horizon, which holds
//! back newer events from healthy streams until it catches up, so the output
//! stays totally ordered by `(timestamp, stream, id)`.
//!
//! Per cycle:
//!
//! refresh streams (follow mode, every N cycles)
//! spawn poll_stream per due cursor
//! join (cancellable)
//! admit events: dedup, window, late, filter
//! release pooled events below the watermark
//! termination check (non-follow only)

use crate::backend::LogBackend;
use crate::list::Lister;
use crate::model::{EventKey, LogEvent, ResolvedWindow, TimeWindow};
use crate::tail::cursor::StreamCursor;
use crate::tail::fetcher::{EventFetcher, FetchStatus, StreamReport, poll_stream};
use crate::tail::seen::SeenSet;
use crate::tail::{
    CancelSignal, Clock, EventFilter, StreamEnumerator, StreamPattern, SystemClock, TailError,
    TailSettings, TailWarning,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tokio::task::JoinSet;

/// What a caller asks to tail.
#[derive(Debug, Clone)]
pub struct TailRequest {
    pub group: String,

    /// Exact stream name, `prefix*`, a glob, or `*` for every stream.
    pub stream_pattern: String,

    pub window: TimeWindow,
    pub follow: bool,
    pub filter: Option<EventFilter>,
}

impl TailRequest {
    pub fn new(group: impl Into<String>, stream_pattern: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            stream_pattern: stream_pattern.into(),
            window: TimeWindow::unbounded(),
            follow: false,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailItem {
    Event(LogEvent),
    Warning(TailWarning),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub cycles: u64,
    pub fetched: u64,
    pub emitted: u64,
    pub duplicates: u64,
    pub filtered: u64,
    pub late: u64,
    pub throttled: u64,
    pub dropped_streams: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Running,
    Finished,
    Cancelled,
}

pub struct MergeScheduler<B> {
    backend: Arc<B>,
    clock: Arc<dyn Clock>,
    settings: TailSettings,
}

impl<B: LogBackend> MergeScheduler<B> {
    pub fn new(backend: Arc<B>, settings: TailSettings) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock), settings)
    }

    pub fn with_clock(backend: Arc<B>, clock: Arc<dyn Clock>, settings: TailSettings) -> Self {
        Self {
            backend,
            clock,
            settings,
        }
    }

    /// Opens a tail session.
    ///
    /// Fails only for session-level problems: a bad pattern, an unknown group
    /// or exact stream, no matching streams at all, or cancellation while the
    /// streams are being resolved. Everything after this point is reported
    /// in-band through [`TailSession::next`].
    pub async fn tail(
        &self,
        request: TailRequest,
        cancel: CancelSignal,
    ) -> Result<TailSession<B>, TailError> {
        let pattern = StreamPattern::parse(&request.stream_pattern)?;
        let window = request.window.resolve(self.clock.now());

        let enumerator = StreamEnumerator::new(Lister::with_retry(
            self.backend.clone(),
            self.clock.clone(),
            self.settings.unavailable_retry,
        ));
        let mut signal = cancel.clone();
        let streams = tokio::select! {
            resolved = enumerator.resolve(&request.group, &pattern) => resolved?,
            _ = signal.cancelled() => return Err(TailError::Cancelled),
        };
        if streams.is_empty() {
            return Err(TailError::NoStreams {
                group: request.group,
                pattern: pattern.to_string(),
            });
        }

        tracing::info!(
            group = %request.group,
            %pattern,
            streams = streams.len(),
            follow = request.follow,
            start = %window.start,
            end = ?window.end,
            "tail session opened"
        );

        let cursors = streams
            .into_iter()
            .map(|stream| (stream.clone(), StreamCursor::new(stream, window.start)))
            .collect();

        Ok(TailSession {
            group: request.group,
            pattern,
            window,
            follow: request.follow,
            filter: request.filter,
            fetcher: EventFetcher::new(self.backend.clone(), self.settings.page_size),
            enumerator,
            clock: self.clock.clone(),
            settings: self.settings.clone(),
            cancel,
            cursors,
            seen: SeenSet::default(),
            pool: BTreeMap::new(),
            frontier: None,
            ready: VecDeque::new(),
            cycle: 0,
            pages_outstanding: false,
            newest_fetched: None,
            state: SessionState::Running,
            stats: SessionStats::default(),
        })
    }
}

/// A running tail: a lazy, pull-based sequence of [`TailItem`]s.
pub struct TailSession<B> {
    group: String,
    pattern: StreamPattern,
    window: ResolvedWindow,
    follow: bool,
    filter: Option<EventFilter>,

    fetcher: EventFetcher<B>,
    enumerator: StreamEnumerator<B>,
    clock: Arc<dyn Clock>,
    settings: TailSettings,
    cancel: CancelSignal,

    cursors: BTreeMap<String, StreamCursor>,
    seen: SeenSet,
    pool: BTreeMap<EventKey, LogEvent>,
    frontier: Option<EventKey>,
    ready: VecDeque<TailItem>,

    cycle: u64,
    pages_outstanding: bool,
    newest_fetched: Option<DateTime<Utc>>,
    state: SessionState,
    stats: SessionStats,
}

impl<B: LogBackend> TailSession<B> {
    /// Next event or warning. `None` once the session has finished or been
    /// cancelled; a follow session only ever ends by cancellation.
    pub async fn next(&mut self) -> Option<TailItem> {
        loop {
            if self.cancel.is_cancelled() {
                self.mark_cancelled();
                return None;
            }
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            if self.state != SessionState::Running {
                return None;
            }
            if self.cycle > 0 && !self.pages_outstanding && !self.idle().await {
                self.mark_cancelled();
                return None;
            }
            self.run_cycle().await;
        }
    }

    /// Runs exactly one poll cycle, without the idle wait, and returns what it
    /// produced.
    pub async fn poll_cycle(&mut self) -> Vec<TailItem> {
        if self.state == SessionState::Running && !self.cancel.is_cancelled() {
            self.run_cycle().await;
        }
        if self.cancel.is_cancelled() {
            self.mark_cancelled();
            return Vec::new();
        }
        self.ready.drain(..).collect()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn active_streams(&self) -> impl Iterator<Item = &str> {
        self.cursors.keys().map(String::as_str)
    }

    /// Key of the last event emitted from `stream`, if any.
    pub fn last_emitted(&self, stream: &str) -> Option<&EventKey> {
        self.cursors.get(stream)?.last_emitted.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.state != SessionState::Running
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == SessionState::Cancelled
    }

    fn mark_cancelled(&mut self) {
        if self.state == SessionState::Running {
            tracing::info!(group = %self.group, cycles = self.cycle, "tail session cancelled");
            self.state = SessionState::Cancelled;
        }
        self.ready.clear();
    }

    /// Waits one poll interval. Returns false if cancelled meanwhile.
    async fn idle(&self) -> bool {
        let clock = self.clock.clone();
        let interval = self.settings.poll_interval;
        let mut cancel = self.cancel.clone();

        tokio::select! {
            _ = clock.sleep(interval) => true,
            _ = cancel.cancelled() => false,
        }
    }

    async fn run_cycle(&mut self) {
        self.cycle += 1;
        self.stats.cycles += 1;

        if self.refresh_due() {
            self.refresh_streams().await;
            if self.cancel.is_cancelled() {
                self.mark_cancelled();
                return;
            }
        }

        let now = self.clock.now();
        let mut workers = JoinSet::new();
        let mut deferred = 0usize;

        for cursor in self.cursors.values() {
            if !cursor.is_due(now) {
                deferred += 1;
                continue;
            }
            let plan = cursor.plan(&self.group, &self.window, &self.settings);
            workers.spawn(poll_stream(self.fetcher.clone(), self.clock.clone(), plan));
        }
        let spawned = workers.len();

        let Some(reports) = self.join_workers(&mut workers).await else {
            self.abandon_workers(workers).await;
            self.mark_cancelled();
            return;
        };

        let fetched_before = self.stats.fetched;
        let emitted_before = self.stats.emitted;
        // A worker that died without reporting leaves its cursor untouched,
        // so that stream is polled again next cycle.
        let lost = spawned - reports.len();
        let mut all_drained = deferred == 0 && lost == 0;
        self.pages_outstanding = false;

        for report in reports {
            all_drained &= self.apply_report(report);
        }

        self.release(self.watermark());
        self.prune_seen();

        tracing::debug!(
            cycle = self.cycle,
            streams = self.cursors.len(),
            deferred,
            lost,
            fetched = self.stats.fetched - fetched_before,
            emitted = self.stats.emitted - emitted_before,
            pooled = self.pool.len(),
            seen = self.seen.len(),
            "poll cycle complete"
        );

        if !self.follow && self.is_complete(all_drained) {
            self.release(None);
            self.state = SessionState::Finished;
            tracing::info!(
                group = %self.group,
                cycles = self.cycle,
                emitted = self.stats.emitted,
                "tail session finished"
            );
        }
    }

    /// Merge barrier. `None` if cancellation arrived first.
    async fn join_workers(
        &self,
        workers: &mut JoinSet<StreamReport>,
    ) -> Option<Vec<StreamReport>> {
        let mut cancel = self.cancel.clone();

        tokio::select! {
            reports = collect_reports(workers) => Some(reports),
            _ = cancel.cancelled() => None,
        }
    }

    /// Lets in-flight fetches finish within the grace period, then aborts them.
    async fn abandon_workers(&self, mut workers: JoinSet<StreamReport>) {
        let grace = self.settings.cancel_grace;
        let drained =
            tokio::time::timeout(grace, async { while workers.join_next().await.is_some() {} })
                .await;

        if drained.is_err() {
            tracing::debug!(in_flight = workers.len(), "aborting stream workers");
            workers.abort_all();
        }
    }

    /// Folds one worker report into session state. Returns whether the stream
    /// counts as drained for the termination check.
    fn apply_report(&mut self, mut report: StreamReport) -> bool {
        let events = std::mem::take(&mut report.events);
        let newest = events.iter().map(|e| e.timestamp).max();
        self.stats.fetched += events.len() as u64;
        if let Some(newest) = newest {
            self.newest_fetched = self.newest_fetched.max(Some(newest));
        }

        tracing::trace!(
            stream = %report.stream,
            pages = report.pages,
            events = events.len(),
            "stream report"
        );

        let now = self.clock.now();
        let mut drained = true;

        if let Some(cursor) = self.cursors.get_mut(&report.stream) {
            match report.status {
                FetchStatus::Drained => {
                    cursor.record_pages(newest, None, true, report.started_at);
                    cursor.record_success();
                }
                FetchStatus::MorePages => {
                    cursor.record_pages(newest, report.next_token, false, report.started_at);
                    cursor.record_success();
                    self.pages_outstanding = true;
                    drained = false;
                }
                FetchStatus::Throttled { message } => {
                    cursor.record_pages(newest, report.next_token, false, report.started_at);
                    let delay = self
                        .settings
                        .throttle_backoff
                        .jittered_delay(cursor.throttle_attempts);
                    cursor.record_throttle(now, delay);
                    self.stats.throttled += 1;
                    tracing::warn!(
                        stream = %report.stream,
                        attempts = cursor.throttle_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %message,
                        "stream throttled; backing off"
                    );
                    drained = false;
                }
                FetchStatus::Failed { error, attempts } => {
                    self.cursors.remove(&report.stream);
                    self.stats.dropped_streams += 1;
                    tracing::warn!(
                        stream = %report.stream,
                        attempts,
                        error = %error,
                        "stream dropped after repeated failures"
                    );
                    self.ready.push_back(TailItem::Warning(TailWarning::StreamDropped {
                        stream: report.stream.clone(),
                        reason: error.to_string(),
                    }));
                }
                FetchStatus::Vanished => {
                    self.cursors.remove(&report.stream);
                    tracing::warn!(stream = %report.stream, "stream no longer exists");
                    self.ready.push_back(TailItem::Warning(TailWarning::StreamVanished {
                        stream: report.stream.clone(),
                    }));
                }
            }
        }

        for event in events {
            self.admit(event);
        }

        drained
    }

    /// Pools a fetched event unless it was seen, falls outside the window,
    /// would break the emitted order, or fails the filter.
    fn admit(&mut self, event: LogEvent) {
        let key = event.key();

        if self.seen.contains(&key) || self.pool.contains_key(&key) {
            self.stats.duplicates += 1;
            return;
        }
        if !self.window.contains(event.timestamp) {
            return;
        }
        if self.frontier.as_ref().is_some_and(|frontier| &key <= frontier) {
            self.stats.late += 1;
            tracing::debug!(
                stream = %event.stream,
                id = %event.id,
                timestamp = %event.timestamp,
                "skipping event older than emitted output"
            );
            return;
        }
        if let Some(filter) = &self.filter {
            if !filter.matches(&event.message) {
                self.stats.filtered += 1;
                self.seen.insert(key);
                return;
            }
        }

        self.pool.insert(key, event);
    }

    /// Oldest horizon among active streams; `None` when nothing can lag.
    fn watermark(&self) -> Option<DateTime<Utc>> {
        self.cursors.values().map(|c| c.horizon).min()
    }

    /// Emits pooled events strictly below `watermark`, or everything for `None`.
    fn release(&mut self, watermark: Option<DateTime<Utc>>) {
        while let Some(entry) = self.pool.first_entry() {
            if watermark.is_some_and(|w| entry.key().timestamp >= w) {
                break;
            }
            let (key, event) = entry.remove_entry();
            if let Some(cursor) = self.cursors.get_mut(&key.stream) {
                cursor.last_emitted = Some(key.clone());
            }
            self.seen.insert(key.clone());
            self.frontier = Some(key);
            self.stats.emitted += 1;
            self.ready.push_back(TailItem::Event(event));
        }
    }

    /// Keys older than every cursor's resume point can never come back.
    fn prune_seen(&mut self) {
        if let Some(floor) = self.cursors.values().map(|c| c.resume_from).min() {
            self.seen.prune_below(floor);
        }
    }

    fn is_complete(&self, all_drained: bool) -> bool {
        if !all_drained {
            return false;
        }
        match self.window.end {
            None => true,
            Some(end) => {
                end <= self.clock.now() || self.newest_fetched.is_some_and(|newest| newest >= end)
            }
        }
    }

    fn refresh_due(&self) -> bool {
        let every = self.settings.refresh_every_cycles.max(1);
        self.follow && self.cycle > 1 && (self.cycle - 1) % every == 0
    }

    /// Re-resolves the stream set. Returns early, changing nothing, if
    /// cancelled mid-listing.
    async fn refresh_streams(&mut self) {
        let mut cancel = self.cancel.clone();
        let outcome = tokio::select! {
            resolved = self.enumerator.resolve(&self.group, &self.pattern) => resolved,
            _ = cancel.cancelled() => return,
        };

        let resolved = match outcome {
            Ok(streams) => streams,
            // An exact stream that disappeared resolves to nothing.
            Err(TailError::StreamNotFound { stream, .. }) => {
                tracing::debug!(%stream, "stream missing during refresh; skipping");
                BTreeSet::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "stream refresh failed; keeping current streams");
                self.ready.push_back(TailItem::Warning(TailWarning::RefreshFailed {
                    reason: e.to_string(),
                }));
                return;
            }
        };

        let vanished: Vec<String> = self
            .cursors
            .keys()
            .filter(|stream| !resolved.contains(*stream))
            .cloned()
            .collect();
        for stream in vanished {
            // Already pooled events stay and drain with the next release.
            let last = self
                .cursors
                .remove(&stream)
                .and_then(|cursor| cursor.last_emitted);
            tracing::info!(%stream, last_emitted = ?last, "stream left the session");
            self.ready
                .push_back(TailItem::Warning(TailWarning::StreamVanished { stream }));
        }

        let seed = self
            .frontier
            .as_ref()
            .map_or(self.window.start, |f| f.timestamp.max(self.window.start));
        for stream in resolved {
            if !self.cursors.contains_key(&stream) {
                tracing::info!(%stream, seed = %seed, "stream joined the session");
                self.cursors
                    .insert(stream.clone(), StreamCursor::new(stream, seed));
            }
        }
    }
}

async fn collect_reports(workers: &mut JoinSet<StreamReport>) -> Vec<StreamReport> {
    let mut reports = Vec::with_capacity(workers.len());
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => tracing::error!(error = %e, "stream worker panicked"),
        }
    }
    reports
}

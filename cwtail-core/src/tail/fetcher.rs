use crate::backend::{BackendError, EventQuery, LogBackend, RawEvent};
use crate::model::{EventId, LogEvent, PageToken, ResolvedWindow, from_millis};
use crate::tail::Clock;
use crate::tail::backoff::{BackoffConfig, RetryResult, is_unavailable, retry_with_backoff};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One page of a single stream.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub events: Vec<LogEvent>,
    pub next_token: Option<PageToken>,
    pub has_more: bool,
}

/// Issues single-page event queries for one stream at a time.
pub struct EventFetcher<B> {
    backend: Arc<B>,
    page_size: Option<usize>,
}

impl<B> Clone for EventFetcher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            page_size: self.page_size,
        }
    }
}

impl<B: LogBackend> EventFetcher<B> {
    pub fn new(backend: Arc<B>, page_size: Option<usize>) -> Self {
        Self { backend, page_size }
    }

    /// Fetches one page. Window bounds are pushed down to the backend so no
    /// history outside the window is transferred.
    pub async fn fetch_page(
        &self,
        group: &str,
        stream: &str,
        token: Option<&PageToken>,
        window: &ResolvedWindow,
    ) -> Result<FetchedPage, BackendError> {
        let page = self
            .backend
            .fetch_events(EventQuery {
                group: group.to_string(),
                streams: vec![stream.to_string()],
                start_ms: Some(window.start.timestamp_millis()),
                end_ms: window.end.map(|end| end.timestamp_millis()),
                token: token.cloned(),
                limit: self.page_size,
            })
            .await?;

        let events = page
            .events
            .into_iter()
            .map(|raw| into_log_event(group, raw))
            .collect();

        Ok(FetchedPage {
            events,
            has_more: page.next_token.is_some(),
            next_token: page.next_token,
        })
    }
}

fn into_log_event(group: &str, raw: RawEvent) -> LogEvent {
    LogEvent {
        id: EventId(raw.id),
        timestamp: from_millis(raw.timestamp_ms),
        message: raw.message,
        stream: raw.stream,
        group: group.to_string(),
    }
}

/// Everything a stream worker needs for one cycle, owned so the worker can
/// run as its own task.
#[derive(Debug, Clone)]
pub(crate) struct FetchPlan {
    pub group: String,
    pub stream: String,
    pub token: Option<PageToken>,
    pub window: ResolvedWindow,
    pub page_budget: usize,
    pub retry: BackoffConfig,
}

#[derive(Debug)]
pub(crate) enum FetchStatus {
    /// Last page reported no continuation.
    Drained,
    /// Page budget ran out with pages still outstanding.
    MorePages,
    Throttled { message: String },
    Failed { error: BackendError, attempts: u32 },
    Vanished,
}

#[derive(Debug)]
pub(crate) struct StreamReport {
    pub stream: String,
    pub started_at: DateTime<Utc>,
    pub events: Vec<LogEvent>,
    pub next_token: Option<PageToken>,
    pub pages: usize,
    pub status: FetchStatus,
}

/// Pages one stream until it drains, the page budget is spent, or the
/// backend pushes back. Events from pages fetched before a failure are kept.
pub(crate) async fn poll_stream<B: LogBackend>(
    fetcher: EventFetcher<B>,
    clock: Arc<dyn Clock>,
    plan: FetchPlan,
) -> StreamReport {
    let started_at = clock.now();
    let mut events = Vec::new();
    let mut token = plan.token.clone();
    let mut pages = 0;

    let status = loop {
        let result = retry_with_backoff(&plan.retry, clock.as_ref(), is_unavailable, || {
            fetcher.fetch_page(&plan.group, &plan.stream, token.as_ref(), &plan.window)
        })
        .await;

        match result {
            RetryResult::Success(page) => {
                pages += 1;
                events.extend(page.events);
                token = page.next_token;

                if !page.has_more {
                    break FetchStatus::Drained;
                }
                if pages >= plan.page_budget {
                    break FetchStatus::MorePages;
                }
            }
            RetryResult::NotRetried(BackendError::Throttled { message }) => {
                break FetchStatus::Throttled { message };
            }
            RetryResult::NotRetried(BackendError::StreamNotFound { .. }) => {
                break FetchStatus::Vanished;
            }
            RetryResult::NotRetried(error) => break FetchStatus::Failed { error, attempts: 1 },
            RetryResult::ExhaustedRetries {
                last_error,
                attempts,
            } => {
                break FetchStatus::Failed {
                    error: last_error,
                    attempts,
                };
            }
        }
    };

    StreamReport {
        stream: plan.stream,
        started_at,
        events,
        next_token: token,
        pages,
        status,
    }
}

use crate::model::{EventKey, ONE_MILLI, PageToken, ResolvedWindow};
use crate::tail::TailSettings;
use crate::tail::fetcher::FetchPlan;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Per-stream fetch state, owned by the scheduler.
#[derive(Debug, Clone)]
pub(crate) struct StreamCursor {
    pub stream: String,

    /// Continuation of an unfinished page walk.
    pub next_token: Option<PageToken>,

    /// Inclusive lower bound for a fresh query once the token is spent.
    pub resume_from: DateTime<Utc>,

    /// Every event of this stream older than the horizon has been fetched.
    pub horizon: DateTime<Utc>,

    pub last_emitted: Option<EventKey>,

    pub throttle_attempts: u32,
    pub not_before: Option<DateTime<Utc>>,
}

impl StreamCursor {
    pub fn new(stream: impl Into<String>, seed: DateTime<Utc>) -> Self {
        Self {
            stream: stream.into(),
            next_token: None,
            resume_from: seed,
            horizon: seed,
            last_emitted: None,
            throttle_attempts: 0,
            not_before: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_none_or(|at| now >= at)
    }

    pub fn plan(&self, group: &str, window: &ResolvedWindow, settings: &TailSettings) -> FetchPlan {
        FetchPlan {
            group: group.to_string(),
            stream: self.stream.clone(),
            token: self.next_token.clone(),
            window: ResolvedWindow {
                start: window.start.max(self.resume_from),
                end: window.end,
            },
            page_budget: settings.page_budget.max(1),
            retry: settings.unavailable_retry,
        }
    }

    /// Folds in the pages a worker fetched. `newest` is the latest event
    /// timestamp among them.
    pub fn record_pages(
        &mut self,
        newest: Option<DateTime<Utc>>,
        next_token: Option<PageToken>,
        drained: bool,
        started_at: DateTime<Utc>,
    ) {
        self.next_token = next_token;

        if let Some(newest) = newest {
            self.resume_from = self.resume_from.max(newest);
        }

        let horizon = match (drained, newest) {
            (true, Some(newest)) => started_at.max(newest + ONE_MILLI),
            (true, None) => started_at,
            // More events may share the newest timestamp on the next page.
            (false, Some(newest)) => newest,
            (false, None) => self.horizon,
        };
        self.horizon = self.horizon.max(horizon);
    }

    pub fn record_success(&mut self) {
        self.throttle_attempts = 0;
        self.not_before = None;
    }

    /// Pushes this stream's next fetch back by `delay`.
    pub fn record_throttle(&mut self, now: DateTime<Utc>, delay: Duration) {
        self.throttle_attempts = self.throttle_attempts.saturating_add(1);
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::seconds(60));
        self.not_before = Some(now + delay);
    }
}

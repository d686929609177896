use crate::tail::backoff::BackoffConfig;
use std::time::Duration;

/// Runtime knobs of the merge scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct TailSettings {
    /// Idle time between poll cycles once every stream is caught up.
    pub poll_interval: Duration,

    /// Pages fetched per stream per cycle, so one busy stream cannot starve
    /// the others.
    pub page_budget: usize,

    /// Requested events per page; the backend may cap it further.
    pub page_size: Option<usize>,

    /// Follow mode re-lists streams every this many cycles.
    pub refresh_every_cycles: u64,

    /// How long in-flight fetches may run on after cancellation.
    pub cancel_grace: Duration,

    pub throttle_backoff: BackoffConfig,

    pub unavailable_retry: BackoffConfig,
}

impl Default for TailSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            page_budget: 5,
            page_size: None,
            refresh_every_cycles: 5,
            cancel_grace: Duration::from_millis(500),
            throttle_backoff: BackoffConfig::THROTTLE,
            unavailable_retry: BackoffConfig::UNAVAILABLE,
        }
    }
}

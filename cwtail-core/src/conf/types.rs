use crate::tail::backoff::BackoffConfig;
use crate::tail::{FilterSyntax, TailSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Contents of `cwtail.hcl`. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CwtailConfig {
    pub tail: TailConfig,
    pub throttle_backoff: BackoffOverride,
    pub unavailable_retry: BackoffOverride,
    pub store: StoreConfig,
}

impl CwtailConfig {
    pub fn tail_settings(&self) -> TailSettings {
        let tail = &self.tail;
        TailSettings {
            poll_interval: Duration::from_millis(tail.poll_interval_ms),
            page_budget: tail.page_budget,
            page_size: tail.page_size,
            refresh_every_cycles: tail.refresh_every_cycles,
            cancel_grace: Duration::from_millis(tail.cancel_grace_ms),
            throttle_backoff: self.throttle_backoff.resolve(BackoffConfig::THROTTLE),
            unavailable_retry: self.unavailable_retry.resolve(BackoffConfig::UNAVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TailConfig {
    pub poll_interval_ms: u64,
    pub page_budget: usize,

    /// Events requested per page. Left to the backend when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    pub refresh_every_cycles: u64,
    pub cancel_grace_ms: u64,

    /// How `--grep` patterns are read.
    pub filter_syntax: FilterSyntax,
}

impl Default for TailConfig {
    fn default() -> Self {
        let settings = TailSettings::default();
        Self {
            poll_interval_ms: settings.poll_interval.as_millis() as u64,
            page_budget: settings.page_budget,
            page_size: settings.page_size,
            refresh_every_cycles: settings.refresh_every_cycles,
            cancel_grace_ms: settings.cancel_grace.as_millis() as u64,
            filter_syntax: FilterSyntax::default(),
        }
    }
}

/// Partial backoff override. Unset fields keep the built-in policy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

impl BackoffOverride {
    pub fn resolve(&self, base: BackoffConfig) -> BackoffConfig {
        BackoffConfig {
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            initial_delay: self
                .initial_delay_ms
                .map_or(base.initial_delay, Duration::from_millis),
            max_delay: self
                .max_delay_ms
                .map_or(base.max_delay, Duration::from_millis),
            backoff_multiplier: self.multiplier.unwrap_or(base.backoff_multiplier),
            jitter: base.jitter,
        }
    }
}

/// The JSON store read by the file backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,

    /// Names per listing page.
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("store.json"),
            page_size: crate::backend::DEFAULT_LIST_PAGE_SIZE,
        }
    }
}

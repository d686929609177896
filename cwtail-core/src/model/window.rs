use crate::tail::TailError;
use chrono::{DateTime, Utc};

/// Optional `[start, end)` bound on a tail.
///
/// An absent start means "from now", an absent end means "unbounded".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, TailError> {
        match (start, end) {
            (Some(start), Some(end)) if start >= end => Err(TailError::InvalidRange { start, end }),
            _ => Ok(Self { start, end }),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Pins an absent start to `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedWindow {
        ResolvedWindow {
            start: self.start.unwrap_or(now),
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl ResolvedWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && self.end.is_none_or(|end| ts < end)
    }
}

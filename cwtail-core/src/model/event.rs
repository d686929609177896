use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned event identifier. Unique and monotonic within a stream only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque pagination cursor handed out by the backend.
///
/// Only ever passed back verbatim or compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(pub String);

/// One log event as seen by callers of the tailing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub stream: String,
    pub group: String,
}

impl LogEvent {
    pub fn key(&self) -> EventKey {
        EventKey {
            timestamp: self.timestamp,
            stream: self.stream.clone(),
            id: self.id.clone(),
        }
    }
}

/// Total order used for merging: timestamp, then stream, then id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub timestamp: DateTime<Utc>,
    pub stream: String,
    pub id: EventId,
}

impl EventKey {
    /// Smallest possible key at `timestamp`.
    pub fn floor(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            stream: String::new(),
            id: EventId(String::new()),
        }
    }
}

/// Converts a millisecond epoch into a UTC instant, clamping out-of-range values.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(if ms < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Truncates an instant to millisecond precision.
pub fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(ts.timestamp_millis())
}

pub const ONE_MILLI: TimeDelta = TimeDelta::milliseconds(1);

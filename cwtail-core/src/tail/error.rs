use crate::backend::BackendError;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TailError {
    //-------------------------------------------------------------------------
    // Session-level, fatal
    //-------------------------------------------------------------------------
    #[error("invalid time range: start {start} is not before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("invalid filter pattern '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid stream pattern '{pattern}': {source}")]
    InvalidStreamPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no streams in group '{group}' match '{pattern}'")]
    NoStreams { group: String, pattern: String },

    #[error("group '{group}' not found")]
    GroupNotFound { group: String },

    #[error("stream '{stream}' not found in group '{group}'")]
    StreamNotFound { group: String, stream: String },

    #[error("tail cancelled before it started")]
    Cancelled,

    //-------------------------------------------------------------------------
    // Transient
    //-------------------------------------------------------------------------
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("throttled by backend: {message}")]
    Throttled { message: String },
}

impl From<BackendError> for TailError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Throttled { message } => Self::Throttled { message },
            BackendError::Unavailable { message } => Self::BackendUnavailable { message },
            BackendError::StreamNotFound { group, stream } => {
                Self::StreamNotFound { group, stream }
            }
            BackendError::GroupNotFound { group } => Self::GroupNotFound { group },
        }
    }
}

/// Non-fatal conditions surfaced in-band to the consumer of a tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailWarning {
    /// The stream kept failing and is no longer polled.
    StreamDropped { stream: String, reason: String },

    /// The stream disappeared from the group listing.
    StreamVanished { stream: String },

    /// Re-listing streams failed; the previous stream set stays in use.
    RefreshFailed { reason: String },
}

impl fmt::Display for TailWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailWarning::StreamDropped { stream, reason } => {
                write!(f, "stream '{stream}' dropped: {reason}")
            }
            TailWarning::StreamVanished { stream } => write!(f, "stream '{stream}' is gone"),
            TailWarning::RefreshFailed { reason } => {
                write!(f, "stream refresh failed: {reason}")
            }
        }
    }
}

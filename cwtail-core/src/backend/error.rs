use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("request throttled: {message}")]
    Throttled { message: String },

    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("stream '{stream}' not found in group '{group}'")]
    StreamNotFound { group: String, stream: String },

    #[error("group '{group}' not found")]
    GroupNotFound { group: String },
}

impl BackendError {
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

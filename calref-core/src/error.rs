//! Error types for calref.

use thiserror::Error;

/// Errors that can occur while authorizing, fetching, or reconciling events.
#[derive(Error, Debug)]
pub enum CalRefError {
    #[error("Authorization error: {0}")]
    Auth(String),

    #[error("Failed to fetch '{calendar_id}': {message}")]
    Fetch {
        calendar_id: String,
        message: String,
    },

    #[error("Invalid date '{0}': expected RFC3339 or YYYY-MM-DD")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalRefError {
    pub fn fetch(calendar_id: impl Into<String>, message: impl ToString) -> Self {
        CalRefError::Fetch {
            calendar_id: calendar_id.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for CalRefError {
    fn from(e: serde_json::Error) -> Self {
        CalRefError::Serialization(e.to_string())
    }
}

/// Result type alias for calref operations.
pub type CalRefResult<T> = Result<T, CalRefError>;

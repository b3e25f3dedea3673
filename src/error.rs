use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced by tracker commands.
///
/// `Validation` aborts the operation before any state change. `Remote`
/// means the local store was already updated and only the mirror failed.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to save to your trade collection, please try again ({0})")]
    Remote(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Login required: {0}")]
    Unauthenticated(String),

    #[error("Market data error: {0}")]
    MarketData(#[from] ApiError),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TrackerError::Validation(_))
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        TrackerError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

impl From<csv::Error> for TrackerError {
    fn from(err: csv::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

//! Error types for the sync engine.

use pocketsync_remote::RemoteError;
use pocketsync_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can end a sync pass or engine setup.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local store failed.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// The server could not be reached or rejected the request.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading configuration failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration JSON is malformed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if running the pass again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Remote(err) => err.is_retryable(),
            _ => false,
        }
    }
}

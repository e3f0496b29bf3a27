//! Error types for remote calls.

use thiserror::Error;

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A failed call to the REST API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The request never got an answer.
    #[error("network error: {0}")]
    Network(String),

    /// The call exceeded its time bound.
    #[error("request timed out")]
    Timeout,

    /// The response body was not the expected JSON.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The device is known to be offline.
    #[error("device is offline")]
    Offline,

    /// The configured base URL cannot be used.
    #[error("invalid server url: {0}")]
    Url(String),
}

impl RemoteError {
    /// Creates a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Returns true if the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Network(_) | RemoteError::Timeout | RemoteError::Offline => true,
            RemoteError::Status { status, .. } => *status >= 500 || *status == 429,
            RemoteError::Decode(_) | RemoteError::Url(_) => false,
        }
    }

    /// Returns true if the server said the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else if err.is_builder() {
            RemoteError::Url(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::status(status.as_u16(), String::new())
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

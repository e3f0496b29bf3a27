//! Error types for the local store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the local store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database file was written by a newer version of the app.
    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew {
        /// Version found in the file.
        found: i64,
        /// Highest version this build understands.
        supported: i64,
    },

    /// The database directory could not be created.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A store call handed to the blocking pool never ran to completion.
    #[error("store task cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::SchemaTooNew {
            found: 3,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "database schema version 3 is newer than supported version 1"
        );

        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().starts_with("sqlite error"));
    }
}

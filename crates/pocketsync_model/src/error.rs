//! Error types for model parsing and validation.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing or validating entity fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The entry type was not one of INCOME, EXPENSE or SAVINGS.
    #[error("invalid entry type \"{0}\", expected INCOME, EXPENSE or SAVINGS")]
    InvalidEntryType(String),

    /// A month string was not in `YYYY-MM` form or named a month outside 1-12.
    #[error("invalid month \"{0}\", expected YYYY-MM")]
    InvalidMonth(String),

    /// A transaction date was not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid date \"{0}\", expected YYYY-MM-DD")]
    InvalidDate(String),

    /// An amount could not be parsed as a decimal number.
    #[error("invalid amount \"{0}\"")]
    InvalidAmount(String),
}

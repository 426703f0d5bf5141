//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation against a key holding the wrong kind of value.
    #[error("wrong type for key {key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },

    /// Numeric sort met a value that is not a number.
    #[error("sort value is not numeric: {0}")]
    NotNumeric(String),

    /// The store has been shut down.
    #[error("store is closed")]
    Closed,

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

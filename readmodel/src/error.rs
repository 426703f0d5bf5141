//! Error types for the indexing engine.

use readmodel_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type ReadModelResult<T> = Result<T, ReadModelError>;

/// Errors returned by [`ReadModel`](crate::ReadModel) operations.
///
/// Everything except `Store` and `Serialization` is raised before the store
/// is touched.
#[derive(Debug, Error)]
pub enum ReadModelError {
    /// The entity type declaration is incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required argument is missing or empty.
    #[error("validation error: {0}")]
    Validation(String),

    /// The entity type was never registered.
    #[error("{0} is not registered in read-model")]
    NotRegistered(String),

    /// A query was issued with no criteria.
    #[error("criteria was empty")]
    EmptyCriteria,

    /// The requested sort field was not declared for the type.
    #[error("{field} is not a configured sort field for entity type {entity_type}")]
    UnknownSortField { entity_type: String, field: String },

    /// Failure reported by the store, passed through unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Payload (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

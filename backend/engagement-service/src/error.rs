/// Error types for engagement-service
use doc_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// One half of a paired two-document update failed after the other
    /// succeeded. The relation is asymmetric until the caller re-runs the
    /// toggle against a fresh read.
    #[error("partial failure: {completed} committed, pairing write failed: {source}")]
    PartialFailure {
        completed: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                ServiceError::NotFound(format!("{}/{}", collection, id))
            }
            other => ServiceError::Store(other),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

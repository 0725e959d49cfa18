//! # Store Errors
//!
//! Every public store operation fails with a `StoreError`. Collaborator
//! errors are carried verbatim so callers can match on the backend's own
//! failure.

use thiserror::Error;

use crate::backend::BackendError;
use crate::blob::BlobError;
use crate::codec::CodecError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Point read of an absent key
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    /// An attachment pattern failed to compile
    #[error("Invalid attachment pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The retry cap was reached with items still unprocessed
    #[error("Batch retries exhausted with {remaining} items unprocessed")]
    RetriesExhausted { remaining: usize },

    /// Open with `error_if_exists` found the table already present
    #[error("Storage already exists: {0}")]
    StorageExists(String),

    /// Open without `create_if_missing` found the table absent
    #[error("Storage does not exist: {0}")]
    StorageMissing(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// The store was used after `close`
    #[error("Store is not open")]
    NotOpen,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "DYNADOWN_NOT_FOUND",
            StoreError::Codec(e) => e.code(),
            StoreError::Backend(e) => e.code(),
            StoreError::Blob(e) => e.code(),
            StoreError::InvalidPattern(_) => "DYNADOWN_INVALID_PATTERN",
            StoreError::RetriesExhausted { .. } => "DYNADOWN_RETRIES_EXHAUSTED",
            StoreError::StorageExists(_) => "DYNADOWN_STORAGE_EXISTS",
            StoreError::StorageMissing(_) => "DYNADOWN_STORAGE_MISSING",
            StoreError::InvalidLocation(_) => "DYNADOWN_INVALID_LOCATION",
            StoreError::NotOpen => "DYNADOWN_NOT_OPEN",
            StoreError::Config(_) => "DYNADOWN_CONFIG_ERROR",
        }
    }

    /// True for a point read of an absent key
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

//! # Blob Store Errors

use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Blob store errors
#[derive(Debug, Clone, Error)]
pub enum BlobError {
    // Bucket errors
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    // Object errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Checksum mismatch: {0}")]
    ChecksumMismatch(String),

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BlobError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            BlobError::BucketNotFound(_) => "DYNADOWN_BLOB_BUCKET_NOT_FOUND",
            BlobError::ObjectNotFound(_) => "DYNADOWN_BLOB_OBJECT_NOT_FOUND",
            BlobError::InvalidPath(_) => "DYNADOWN_BLOB_INVALID_PATH",
            BlobError::ChecksumMismatch(_) => "DYNADOWN_BLOB_CHECKSUM_MISMATCH",
            BlobError::IoError(_) => "DYNADOWN_BLOB_IO_ERROR",
            BlobError::Internal(_) => "DYNADOWN_BLOB_INTERNAL",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::ObjectNotFound(_))
    }
}

impl From<std::io::Error> for BlobError {
    fn from(e: std::io::Error) -> Self {
        BlobError::IoError(e.to_string())
    }
}

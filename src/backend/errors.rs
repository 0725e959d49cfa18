//! # Backend Errors

use thiserror::Error;

/// Result type for primary-store operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Primary-store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Point read on an absent key
    #[error("Not found: {0}")]
    NotFound(String),

    /// The table itself does not exist
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The table already exists
    #[error("Resource in use: {0}")]
    ResourceInUse(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected as malformed
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackendError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::NotFound(_) => "DYNADOWN_BACKEND_NOT_FOUND",
            BackendError::ResourceNotFound(_) => "DYNADOWN_BACKEND_RESOURCE_NOT_FOUND",
            BackendError::ResourceInUse(_) => "DYNADOWN_BACKEND_RESOURCE_IN_USE",
            BackendError::Unavailable(_) => "DYNADOWN_BACKEND_UNAVAILABLE",
            BackendError::Validation(_) => "DYNADOWN_BACKEND_VALIDATION",
            BackendError::Internal(_) => "DYNADOWN_BACKEND_INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            BackendError::ResourceNotFound("t".into()).code(),
            "DYNADOWN_BACKEND_RESOURCE_NOT_FOUND"
        );
        assert_eq!(
            BackendError::Unavailable("down".into()).to_string(),
            "Backend unavailable: down"
        );
    }
}

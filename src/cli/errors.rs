//! CLI-specific error types

use std::fmt;
use std::io;

use crate::errors::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// A request line could not be understood
    InvalidRequest,
    /// The store rejected the request; carries the store's own code
    Store(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DYNADOWN_CLI_CONFIG_ERROR",
            Self::IoError => "DYNADOWN_CLI_IO_ERROR",
            Self::InvalidRequest => "DYNADOWN_CLI_INVALID_REQUEST",
            Self::Store(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Config(message) => Self::config_error(message),
            other => Self::new(CliErrorCode::Store(other.code()), other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_code_passes_through() {
        let err: CliError = StoreError::NotFound("a".into()).into();
        assert_eq!(err.code_str(), "DYNADOWN_NOT_FOUND");
        assert_eq!(err.message(), "Key not found: a");
    }

    #[test]
    fn test_config_error() {
        let err: CliError = StoreError::Config("bad".into()).into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert_eq!(err.to_string(), "DYNADOWN_CLI_CONFIG_ERROR: bad");
    }
}

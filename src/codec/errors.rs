//! # Codec Errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Attribute codec errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The value has no matching attribute-value rule
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A Number attribute did not hold a decimal string
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Text could not be decoded with the declared encoding
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Wire JSON did not have the shape of an attribute value
    #[error("Malformed attribute value: {0}")]
    Malformed(String),
}

impl CodecError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::UnsupportedType(_) => "DYNADOWN_CODEC_UNSUPPORTED_TYPE",
            CodecError::InvalidNumber(_) => "DYNADOWN_CODEC_INVALID_NUMBER",
            CodecError::InvalidEncoding(_) => "DYNADOWN_CODEC_INVALID_ENCODING",
            CodecError::Malformed(_) => "DYNADOWN_CODEC_MALFORMED",
        }
    }
}

//! Byte casting for attachment payloads

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::errors::{CodecError, CodecResult};
use super::value::Value;

/// Text encoding of an attachment's data field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataEncoding {
    #[serde(alias = "utf-8")]
    Utf8,
    Base64,
    #[serde(alias = "binary")]
    Latin1,
}

impl DataEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataEncoding::Utf8 => "utf8",
            DataEncoding::Base64 => "base64",
            DataEncoding::Latin1 => "latin1",
        }
    }

    /// Encode text into bytes
    pub fn encode(&self, text: &str) -> CodecResult<Vec<u8>> {
        match self {
            DataEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            DataEncoding::Base64 => STANDARD
                .decode(text.trim())
                .map_err(|e| CodecError::InvalidEncoding(e.to_string())),
            DataEncoding::Latin1 => Ok(text.chars().map(|c| c as u32 as u8).collect()),
        }
    }

    /// Decode bytes back into text
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            DataEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            DataEncoding::Base64 => STANDARD.encode(bytes),
            DataEncoding::Latin1 => bytes.iter().map(|b| *b as char).collect(),
        }
    }
}

impl fmt::Display for DataEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataEncoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(DataEncoding::Utf8),
            "base64" => Ok(DataEncoding::Base64),
            "latin1" | "binary" => Ok(DataEncoding::Latin1),
            other => Err(CodecError::InvalidEncoding(other.to_string())),
        }
    }
}

/// Cast a field value to raw bytes.
///
/// Strings are encoded with `encoding` (UTF-8 when none is declared), numbers
/// become their 8-byte big-endian IEEE-754 form, maps their JSON text, and an
/// absent or null field an empty payload.
pub fn cast_to_bytes(value: Option<&Value>, encoding: Option<DataEncoding>) -> CodecResult<Vec<u8>> {
    let value = match value {
        Some(v) => v,
        None => return Ok(Vec::new()),
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Binary(bytes) => Ok(bytes.clone()),
        Value::String(s) => encoding.unwrap_or(DataEncoding::Utf8).encode(s),
        Value::Bool(b) => Ok(vec![u8::from(*b)]),
        Value::Number(n) => Ok(n.to_be_bytes().to_vec()),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) if n.fract() == 0.0 && (0.0..=255.0).contains(n) => Ok(*n as u8),
                other => Err(CodecError::UnsupportedType(format!(
                    "list element {} is not a byte",
                    other.type_name()
                ))),
            })
            .collect(),
        Value::Map(_) => serde_json::to_vec(&value.to_json())
            .map_err(|e| CodecError::Malformed(e.to_string())),
    }
}

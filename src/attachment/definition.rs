//! # Attachment Definitions

use regex::Regex;

use crate::codec::DataEncoding;

/// Describes which subtrees of a value are externalized to blob storage.
///
/// `pattern` is tested against the "/"-joined key path of every map node,
/// starting with the record's sort key. A matching node must carry its
/// payload in `data_field` and, optionally, a content type in
/// `content_type_field`.
#[derive(Debug, Clone)]
pub struct AttachmentDefinition {
    pub pattern: Regex,
    pub content_type_field: String,
    pub data_field: String,
    pub encoding: Option<DataEncoding>,
}

impl AttachmentDefinition {
    /// Create a definition from a regex source string
    pub fn new(
        pattern: &str,
        content_type_field: impl Into<String>,
        data_field: impl Into<String>,
        encoding: Option<DataEncoding>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            content_type_field: content_type_field.into(),
            data_field: data_field.into(),
            encoding,
        })
    }

    /// Check a key path against the pattern
    pub fn matches(&self, key_path: &str) -> bool {
        self.pattern.is_match(key_path)
    }
}

/// A payload extracted from a value, ready for the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Blob storage key (the key path that produced it)
    pub key: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        let def = AttachmentDefinition::new(r"^doc\d+/files/\w+$", "type", "data", None).unwrap();
        assert!(def.matches("doc1/files/cover"));
        assert!(!def.matches("doc1/files"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(AttachmentDefinition::new("(", "type", "data", None).is_err());
    }
}

//! # Attachment Pointers
//!
//! A pointer replaces an externalized subtree in place and holds only the
//! blob key. Stored shape: `{"_s3key": "<key path>"}`.

use std::collections::{BTreeMap, VecDeque};

use crate::codec::Value;

use super::path::build_key_path;

/// Field name carrying the blob key inside a pointer map
pub const POINTER_FIELD: &str = "_s3key";

/// In-place reference to an externalized payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPointer {
    pub key: String,
}

impl AttachmentPointer {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Stored form of the pointer
    pub fn to_value(&self) -> Value {
        Value::map_from([(POINTER_FIELD, Value::String(self.key.clone()))])
    }

    /// Recognize a stored pointer
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.get(POINTER_FIELD) {
            Some(Value::String(key)) => Some(Self::new(key.clone())),
            _ => None,
        }
    }
}

/// Pointers found in one stored record, keyed by key path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerMap {
    /// Record sort key the paths start from
    pub root: String,
    pub pointers: BTreeMap<String, AttachmentPointer>,
}

impl PointerMap {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            pointers: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// Blob keys referenced by this record, deduplicated
    pub fn blob_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pointers.values().map(|p| p.key.clone()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Collect every attachment pointer in a stored value.
///
/// Walks map nodes breadth-first; a pointer node is not descended into.
pub fn extract_pointers(root_key: &str, value: &Value) -> PointerMap {
    let mut result = PointerMap::new(root_key);
    if !value.is_map() {
        return result;
    }
    if let Some(pointer) = AttachmentPointer::from_value(value) {
        result.pointers.insert(root_key.to_string(), pointer);
        return result;
    }

    let mut queue: VecDeque<(String, &Value)> = VecDeque::new();
    queue.push_back((root_key.to_string(), value));

    while let Some((key_path, node)) = queue.pop_front() {
        let children = match node.as_map() {
            Some(children) => children,
            None => continue,
        };
        for (field, child) in children {
            if !child.is_map() {
                continue;
            }
            let child_path = build_key_path(&key_path, field);
            match AttachmentPointer::from_value(child) {
                Some(pointer) => {
                    result.pointers.insert(child_path, pointer);
                }
                None => queue.push_back((child_path, child)),
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_shape() {
        let pointer = AttachmentPointer::new("k/a");
        let value = pointer.to_value();
        assert_eq!(value.get(POINTER_FIELD), Some(&Value::String("k/a".into())));
        assert_eq!(AttachmentPointer::from_value(&value), Some(pointer));
        assert_eq!(AttachmentPointer::from_value(&Value::map()), None);
    }

    #[test]
    fn test_extract_nested_pointers() {
        let value = Value::map_from([
            ("a", AttachmentPointer::new("k/a").to_value()),
            (
                "b",
                Value::map_from([("c", AttachmentPointer::new("k/b/c").to_value())]),
            ),
            ("d", Value::String("plain".into())),
        ]);
        let pointers = extract_pointers("k", &value);
        assert_eq!(pointers.len(), 2);
        assert_eq!(pointers.pointers["k/a"].key, "k/a");
        assert_eq!(pointers.pointers["k/b/c"].key, "k/b/c");
        assert_eq!(pointers.blob_keys(), vec!["k/a".to_string(), "k/b/c".to_string()]);
    }

    #[test]
    fn test_root_pointer() {
        let value = AttachmentPointer::new("k").to_value();
        let pointers = extract_pointers("k", &value);
        assert_eq!(pointers.pointers["k"].key, "k");
    }

    #[test]
    fn test_non_map_has_no_pointers() {
        assert!(extract_pointers("k", &Value::String("x".into())).is_empty());
    }
}

//! # Attachment Extraction
//!
//! Walks a deep clone of a value breadth-first and externalizes every map
//! node whose key path matches a definition. The walk uses an explicit work
//! queue; each entry carries the field route from the root to its slot, so
//! replacing a node never needs a back-reference to its parent.

use std::collections::{HashSet, VecDeque};

use crate::codec::{cast_to_bytes, CodecResult, Value};

use super::definition::{Attachment, AttachmentDefinition};
use super::path::{build_key_path, node_at_mut};
use super::pointer::{AttachmentPointer, PointerMap};

/// Result of an extraction pass
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Value to store, with matched subtrees replaced by pointers
    pub value: Value,
    pub attachments: Vec<Attachment>,
}

impl Extraction {
    fn unchanged(value: &Value) -> Self {
        Self {
            value: value.clone(),
            attachments: Vec::new(),
        }
    }

    /// Blob keys written by this extraction
    pub fn keys(&self) -> HashSet<&str> {
        self.attachments.iter().map(|a| a.key.as_str()).collect()
    }
}

struct WorkItem {
    /// Fields from the root down to this node
    route: Vec<String>,
    key_path: String,
}

/// Split a value into its storable form and the attachments it carries.
///
/// Only map values are walked, and only map children are descended into.
/// A definition matches a node when its pattern matches the key path and
/// the node carries its data field. A node that matched is replaced by a
/// pointer and not walked further. The caller's value is never modified.
pub fn extract(
    root_key: &str,
    value: &Value,
    definitions: &[AttachmentDefinition],
) -> CodecResult<Extraction> {
    if !value.is_map() || definitions.is_empty() {
        return Ok(Extraction::unchanged(value));
    }

    let mut stripped = value.clone();
    let mut attachments = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(WorkItem {
        route: Vec::new(),
        key_path: root_key.to_string(),
    });

    while let Some(item) = queue.pop_front() {
        let node = match node_at_mut(&mut stripped, &item.route) {
            Some(node) => node,
            None => continue,
        };

        // A definition whose data field is absent on this node is inert here
        let matched: Vec<&AttachmentDefinition> = definitions
            .iter()
            .filter(|d| d.matches(&item.key_path) && node.get(&d.data_field).is_some())
            .collect();

        if !matched.is_empty() {
            for definition in matched {
                let content_type = node
                    .get(&definition.content_type_field)
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let data = cast_to_bytes(node.get(&definition.data_field), definition.encoding)?;
                attachments.push(Attachment {
                    key: item.key_path.clone(),
                    data,
                    content_type,
                });
            }
            *node = AttachmentPointer::new(item.key_path.clone()).to_value();
            continue;
        }

        if let Some(children) = node.as_map() {
            for (field, child) in children {
                if !child.is_map() {
                    continue;
                }
                let mut route = item.route.clone();
                route.push(field.clone());
                queue.push_back(WorkItem {
                    route,
                    key_path: build_key_path(&item.key_path, field),
                });
            }
        }
    }

    Ok(Extraction {
        value: stripped,
        attachments,
    })
}

/// Blob keys referenced by a stored record that the new extraction no longer writes
pub fn stale_keys(previous: &PointerMap, current: &Extraction) -> Vec<String> {
    let now = current.keys();
    previous
        .blob_keys()
        .into_iter()
        .filter(|k| !now.contains(k.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::pointer::extract_pointers;

    fn image_def() -> AttachmentDefinition {
        AttachmentDefinition::new(r"^[^/]+/images/[^/]+$", "mime", "bytes", None).unwrap()
    }

    fn image(bytes: &[u8]) -> Value {
        Value::map_from([
            ("mime", Value::String("image/png".into())),
            ("bytes", Value::Binary(bytes.to_vec())),
        ])
    }

    #[test]
    fn test_no_definitions_is_identity() {
        let value = Value::map_from([("a", Value::Bool(true))]);
        let extraction = extract("k", &value, &[]).unwrap();
        assert_eq!(extraction.value, value);
        assert!(extraction.attachments.is_empty());
    }

    #[test]
    fn test_non_map_is_identity() {
        let value = Value::String("x".into());
        let extraction = extract("k", &value, &[image_def()]).unwrap();
        assert_eq!(extraction.value, value);
    }

    #[test]
    fn test_extracts_matching_subtree() {
        let value = Value::map_from([
            ("title", Value::String("post".into())),
            ("images", Value::map_from([("cover", image(b"png-bytes"))])),
        ]);
        let extraction = extract("post1", &value, &[image_def()]).unwrap();

        assert_eq!(
            extraction.attachments,
            vec![Attachment {
                key: "post1/images/cover".into(),
                data: b"png-bytes".to_vec(),
                content_type: Some("image/png".into()),
            }]
        );
        let cover = extraction.value.get("images").and_then(|i| i.get("cover")).unwrap();
        assert_eq!(
            AttachmentPointer::from_value(cover),
            Some(AttachmentPointer::new("post1/images/cover"))
        );
        // Caller's value untouched
        assert_eq!(value.get("images").and_then(|i| i.get("cover")), Some(&image(b"png-bytes")));
    }

    #[test]
    fn test_matched_node_not_descended() {
        let def = AttachmentDefinition::new(r"^k/a", "type", "data", None).unwrap();
        let value = Value::map_from([(
            "a",
            Value::map_from([("data", Value::Binary(vec![1])), ("b", image(b"x"))]),
        )]);
        let extraction = extract("k", &value, &[def]).unwrap();
        assert_eq!(extraction.attachments.len(), 1);
        assert_eq!(extraction.attachments[0].key, "k/a");
    }

    #[test]
    fn test_lists_not_descended() {
        let value = Value::map_from([(
            "images",
            Value::List(vec![image(b"x")]),
        )]);
        let extraction = extract("k", &value, &[image_def()]).unwrap();
        assert!(extraction.attachments.is_empty());
    }

    #[test]
    fn test_every_matching_definition_yields_attachment() {
        let second =
            AttachmentDefinition::new(r"images/cover$", "mime", "bytes", None).unwrap();
        let value = Value::map_from([("images", Value::map_from([("cover", image(b"x"))]))]);
        let extraction = extract("k", &value, &[image_def(), second]).unwrap();
        assert_eq!(extraction.attachments.len(), 2);
        assert!(extraction.attachments.iter().all(|a| a.key == "k/images/cover"));
    }

    #[test]
    fn test_missing_data_field_is_inert() {
        let def = AttachmentDefinition::new(r"^k/a$", "type", "data", None).unwrap();
        let value = Value::map_from([("a", Value::map_from([("x", Value::Bool(true))]))]);
        let extraction = extract("k", &value, &[def]).unwrap();
        assert!(extraction.attachments.is_empty());
        assert_eq!(extraction.value, value);
    }

    #[test]
    fn test_inert_node_is_still_descended() {
        let def = AttachmentDefinition::new(r"^k/a(/b)?$", "mime", "bytes", None).unwrap();
        let value = Value::map_from([(
            "a",
            Value::map_from([("x", Value::Bool(true)), ("b", image(b"inner"))]),
        )]);
        let extraction = extract("k", &value, &[def]).unwrap();
        assert_eq!(extraction.attachments.len(), 1);
        assert_eq!(extraction.attachments[0].key, "k/a/b");
        assert_eq!(
            extraction.value.get("a").and_then(|a| a.get("x")),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_missing_content_type_is_none() {
        let def = AttachmentDefinition::new(r"^k/a$", "nope", "data", None).unwrap();
        let value = Value::map_from([("a", Value::map_from([("data", Value::Binary(vec![5]))]))]);
        let extraction = extract("k", &value, &[def]).unwrap();
        assert_eq!(extraction.attachments[0].data, vec![5]);
        assert_eq!(extraction.attachments[0].content_type, None);
    }

    #[test]
    fn test_stale_keys() {
        let stored = Value::map_from([(
            "images",
            Value::map_from([
                ("cover", AttachmentPointer::new("k/images/cover").to_value()),
                ("thumb", AttachmentPointer::new("k/images/thumb").to_value()),
            ]),
        )]);
        let previous = extract_pointers("k", &stored);
        let value = Value::map_from([("images", Value::map_from([("cover", image(b"new"))]))]);
        let current = extract("k", &value, &[image_def()]).unwrap();
        assert_eq!(stale_keys(&previous, &current), vec!["k/images/thumb".to_string()]);
    }
}

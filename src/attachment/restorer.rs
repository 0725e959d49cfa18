//! # Attachment Restoration
//!
//! Reinflates pointers in a stored value from fetched blob objects.

use crate::blob::FetchedAttachments;
use crate::codec::Value;

use super::definition::AttachmentDefinition;
use super::path::{node_at_mut, relative_segments};
use super::pointer::{AttachmentPointer, PointerMap};

/// Replace pointers with the payloads they reference.
///
/// For every pointer path matched by a definition whose blob was fetched,
/// the pointer becomes a map holding the content type (when the blob has
/// one) under `content_type_field` and the body under `data_field`. The body
/// is decoded to text with the definition's encoding, or kept as binary
/// when none is declared. Missing pointers, paths or blobs are skipped, and
/// an absent pointer map or fetch result leaves the value as it is.
pub fn restore(
    value: Value,
    pointers: Option<&PointerMap>,
    fetched: Option<&FetchedAttachments>,
    definitions: &[AttachmentDefinition],
) -> Value {
    let (pointers, fetched) = match (pointers, fetched) {
        (Some(p), Some(f)) if !p.is_empty() && !f.is_empty() => (p, f),
        _ => return value,
    };

    let mut restored = value;
    for (key_path, pointer) in &pointers.pointers {
        let definition = match definitions.iter().find(|d| d.matches(key_path)) {
            Some(d) => d,
            None => continue,
        };
        let object = match fetched.get(&pointer.key) {
            Some(o) => o,
            None => continue,
        };
        let segments = match relative_segments(&pointers.root, key_path) {
            Some(s) => s,
            None => continue,
        };
        let node = match node_at_mut(&mut restored, &segments) {
            Some(n) => n,
            None => continue,
        };
        if AttachmentPointer::from_value(node).is_none() {
            continue;
        }

        let data = match definition.encoding {
            Some(encoding) => Value::String(encoding.decode(&object.data)),
            None => Value::Binary(object.data.clone()),
        };
        let mut inflated = Value::map();
        if let Some(fields) = inflated.as_map_mut() {
            if let Some(content_type) = &object.content_type {
                fields.insert(
                    definition.content_type_field.clone(),
                    Value::String(content_type.clone()),
                );
            }
            fields.insert(definition.data_field.clone(), data);
        }
        *node = inflated;
    }

    restored
}

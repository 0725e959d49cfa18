//! Attachment extraction and restoration through the codec
//!
//! Mirrors a put followed by a get without a store: extract, serialize,
//! deserialize, collect pointers, fetch, restore.

use std::collections::HashMap;

use dynadown::attachment::{
    extract, extract_pointers, restore, stale_keys, AttachmentDefinition, AttachmentPointer,
};
use dynadown::blob::{BlobObject, FetchedAttachments};
use dynadown::codec::{deserialize, serialize, DataEncoding, Value};

fn profile() -> Value {
    Value::map_from([
        ("name", Value::String("ada".into())),
        (
            "photos",
            Value::map_from([
                (
                    "front",
                    Value::map_from([
                        ("kind", Value::String("image/png".into())),
                        ("raw", Value::Binary(vec![137, 80, 78, 71])),
                    ]),
                ),
                (
                    "side",
                    Value::map_from([
                        ("kind", Value::String("image/jpeg".into())),
                        ("raw", Value::Binary(vec![255, 216])),
                    ]),
                ),
            ]),
        ),
        (
            "bio",
            Value::map_from([("raw", Value::String("aGVsbG8=".into()))]),
        ),
    ])
}

fn definitions() -> Vec<AttachmentDefinition> {
    vec![
        AttachmentDefinition::new(r"^[^/]+/photos/[^/]+$", "kind", "raw", None).unwrap(),
        AttachmentDefinition::new(r"^[^/]+/bio$", "kind", "raw", Some(DataEncoding::Base64))
            .unwrap(),
    ]
}

fn fetch(extraction: &dynadown::attachment::Extraction) -> FetchedAttachments {
    extraction
        .attachments
        .iter()
        .map(|a| {
            (
                a.key.clone(),
                BlobObject {
                    data: a.data.clone(),
                    content_type: a.content_type.clone(),
                },
            )
        })
        .collect::<HashMap<_, _>>()
}

#[test]
fn test_nested_payloads_become_pointers() {
    let defs = definitions();
    let extraction = extract("u1", &profile(), &defs).unwrap();

    let mut keys: Vec<&str> = extraction.keys().into_iter().collect();
    keys.sort();
    assert_eq!(keys, vec!["u1/bio", "u1/photos/front", "u1/photos/side"]);

    let photos = extraction.value.get("photos").unwrap();
    assert_eq!(
        photos.get("front"),
        Some(&AttachmentPointer::new("u1/photos/front").to_value())
    );
    assert_eq!(
        extraction.value.get("name"),
        Some(&Value::String("ada".into()))
    );

    let bio = extraction
        .attachments
        .iter()
        .find(|a| a.key == "u1/bio")
        .unwrap();
    assert_eq!(bio.data, b"hello".to_vec());
    assert_eq!(bio.content_type, None);
}

#[test]
fn test_put_then_get_restores_original() {
    let defs = definitions();
    let original = profile();

    let extraction = extract("u1", &original, &defs).unwrap();
    let stored = serialize(&extraction.value).unwrap();

    let loaded = deserialize(&stored).unwrap();
    let pointers = extract_pointers("u1", &loaded);
    assert_eq!(pointers.len(), 3);

    let fetched = fetch(&extraction);
    let restored = restore(loaded, Some(&pointers), Some(&fetched), &defs);
    assert_eq!(restored, original);
}

#[test]
fn test_missing_blob_leaves_pointer() {
    let defs = definitions();
    let extraction = extract("u1", &profile(), &defs).unwrap();
    let loaded = deserialize(&serialize(&extraction.value).unwrap()).unwrap();
    let pointers = extract_pointers("u1", &loaded);

    let mut fetched = fetch(&extraction);
    fetched.remove("u1/photos/side");

    let restored = restore(loaded, Some(&pointers), Some(&fetched), &defs);
    let photos = restored.get("photos").unwrap();
    assert_eq!(
        photos.get("side"),
        Some(&AttachmentPointer::new("u1/photos/side").to_value())
    );
    assert_eq!(
        photos.get("front").and_then(|f| f.get("raw")),
        Some(&Value::Binary(vec![137, 80, 78, 71]))
    );
}

#[test]
fn test_stale_keys_after_overwrite() {
    let defs = definitions();
    let first = extract("u1", &profile(), &defs).unwrap();
    let previous = extract_pointers("u1", &first.value);

    let mut trimmed = profile();
    if let Some(photos) = trimmed.as_map_mut().and_then(|m| m.get_mut("photos")) {
        if let Some(map) = photos.as_map_mut() {
            map.remove("side");
        }
    }
    let second = extract("u1", &trimmed, &defs).unwrap();

    assert_eq!(stale_keys(&previous, &second), vec!["u1/photos/side".to_string()]);
}

#[test]
fn test_non_map_values_pass_through() {
    let defs = definitions();
    let value = Value::List(vec![Value::Binary(vec![1, 2, 3])]);
    let extraction = extract("k", &value, &defs).unwrap();
    assert!(extraction.attachments.is_empty());
    assert_eq!(extraction.value, value);
}

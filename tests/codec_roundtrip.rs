//! Attribute codec behavior through the wire JSON form

use serde_json::json;

use dynadown::codec::{
    deserialize, serialize, AttributeValue, CodecError, Value, EMPTY_BINARY_SENTINEL,
    EMPTY_STRING_SENTINEL, NAN_SENTINEL,
};

fn deep_value() -> Value {
    Value::map_from([
        ("nan", Value::Number(f64::NAN)),
        ("empty_text", Value::String(String::new())),
        ("empty_bytes", Value::Binary(Vec::new())),
        (
            "level1",
            Value::map_from([(
                "level2",
                Value::List(vec![
                    Value::map_from([("level3", Value::Number(-0.125))]),
                    Value::Bool(false),
                    Value::Null,
                    Value::Binary(vec![0, 255, 7]),
                ]),
            )]),
        ),
    ])
}

#[test]
fn test_deep_value_survives_wire_json() {
    let original = deep_value();
    let wire = serialize(&original).unwrap().to_wire_json();
    let text = serde_json::to_string(&wire).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let decoded = deserialize(&AttributeValue::from_wire_json(&parsed).unwrap()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_sentinels_on_the_wire() {
    let attr = serialize(&Value::Number(f64::NAN)).unwrap();
    assert_eq!(attr, AttributeValue::Binary(NAN_SENTINEL.to_vec()));

    let attr = serialize(&Value::String(String::new())).unwrap();
    assert_eq!(attr.to_wire_json(), json!({"B": "UlUxUVZGbGZVMVJTU1U1SA=="}));
    assert_eq!(attr, AttributeValue::Binary(EMPTY_STRING_SENTINEL.to_vec()));

    let attr = serialize(&Value::Binary(Vec::new())).unwrap();
    assert_eq!(attr, AttributeValue::Binary(EMPTY_BINARY_SENTINEL.to_vec()));
}

#[test]
fn test_whitespace_string_collapses_to_empty() {
    let attr = serialize(&Value::String("   ".into())).unwrap();
    assert_eq!(deserialize(&attr).unwrap(), Value::String(String::new()));
}

#[test]
fn test_serialization_is_deterministic() {
    let a = serde_json::to_string(&serialize(&deep_value()).unwrap().to_wire_json()).unwrap();
    let b = serde_json::to_string(&serialize(&deep_value()).unwrap().to_wire_json()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_number_keeps_precision() {
    let n = 0.1 + 0.2;
    let attr = serialize(&Value::Number(n)).unwrap();
    assert_eq!(deserialize(&attr).unwrap(), Value::Number(n));
    assert_eq!(serialize(&Value::Number(1.5)).unwrap(), AttributeValue::Number("1.5".into()));
}

#[test]
fn test_set_types_are_rejected() {
    let err = AttributeValue::from_wire_json(&json!({"SS": ["a", "b"]})).unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedType(tag) if tag == "SS"));
}

#[test]
fn test_bad_number_is_rejected() {
    let attr = AttributeValue::Number("twelve".into());
    assert!(matches!(deserialize(&attr), Err(CodecError::InvalidNumber(_))));
}

//! Attribute-value union (backend wire type)
//!
//! Exactly one of Null, Number, String, Boolean, Binary, List or Map. On the
//! wire each value is a single-key JSON object whose key is the type tag:
//!
//! | Variant | Wire form |
//! |---------|-----------|
//! | Null    | `{"NULL": true}` |
//! | Number  | `{"N": "1.5"}` |
//! | String  | `{"S": "text"}` |
//! | Boolean | `{"BOOL": true}` |
//! | Binary  | `{"B": "<base64>"}` |
//! | List    | `{"L": [..]}` |
//! | Map     | `{"M": {..}}` |

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use super::errors::{CodecError, CodecResult};

/// Backend attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Null,
    /// Decimal string
    Number(String),
    String(String),
    Boolean(bool),
    Binary(Vec<u8>),
    List(Vec<AttributeValue>),
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Wire type tag
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeValue::Null => "NULL",
            AttributeValue::Number(_) => "N",
            AttributeValue::String(_) => "S",
            AttributeValue::Boolean(_) => "BOOL",
            AttributeValue::Binary(_) => "B",
            AttributeValue::List(_) => "L",
            AttributeValue::Map(_) => "M",
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Encode into the backend's JSON wire form
    pub fn to_wire_json(&self) -> JsonValue {
        match self {
            AttributeValue::Null => json!({ "NULL": true }),
            AttributeValue::Number(n) => json!({ "N": n }),
            AttributeValue::String(s) => json!({ "S": s }),
            AttributeValue::Boolean(b) => json!({ "BOOL": b }),
            AttributeValue::Binary(bytes) => json!({ "B": STANDARD.encode(bytes) }),
            AttributeValue::List(items) => {
                let items: Vec<JsonValue> = items.iter().map(|i| i.to_wire_json()).collect();
                json!({ "L": items })
            }
            AttributeValue::Map(entries) => {
                let entries: JsonMap<String, JsonValue> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_wire_json()))
                    .collect();
                json!({ "M": entries })
            }
        }
    }

    /// Decode the backend's JSON wire form.
    ///
    /// Tags the union has no variant for (string/number/binary sets) are
    /// `UnsupportedType`.
    pub fn from_wire_json(json: &JsonValue) -> CodecResult<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| CodecError::Malformed(format!("expected object, got {}", json)))?;
        if object.len() != 1 {
            return Err(CodecError::Malformed(format!(
                "expected exactly one type tag, got {}",
                object.len()
            )));
        }
        let (tag, body) = object
            .iter()
            .next()
            .ok_or_else(|| CodecError::Malformed("empty attribute value".into()))?;

        match tag.as_str() {
            "NULL" => Ok(AttributeValue::Null),
            "N" => body
                .as_str()
                .map(|n| AttributeValue::Number(n.to_string()))
                .ok_or_else(|| CodecError::InvalidNumber(body.to_string())),
            "S" => body
                .as_str()
                .map(|s| AttributeValue::String(s.to_string()))
                .ok_or_else(|| CodecError::Malformed(format!("S must be a string: {}", body))),
            "BOOL" => body
                .as_bool()
                .map(AttributeValue::Boolean)
                .ok_or_else(|| CodecError::Malformed(format!("BOOL must be a bool: {}", body))),
            "B" => {
                let text = body
                    .as_str()
                    .ok_or_else(|| CodecError::Malformed(format!("B must be base64: {}", body)))?;
                STANDARD
                    .decode(text)
                    .map(AttributeValue::Binary)
                    .map_err(|e| CodecError::InvalidEncoding(e.to_string()))
            }
            "L" => {
                let items = body
                    .as_array()
                    .ok_or_else(|| CodecError::Malformed(format!("L must be an array: {}", body)))?;
                items
                    .iter()
                    .map(AttributeValue::from_wire_json)
                    .collect::<CodecResult<Vec<_>>>()
                    .map(AttributeValue::List)
            }
            "M" => {
                let entries = body
                    .as_object()
                    .ok_or_else(|| CodecError::Malformed(format!("M must be an object: {}", body)))?;
                let mut map = BTreeMap::new();
                for (k, v) in entries {
                    map.insert(k.clone(), AttributeValue::from_wire_json(v)?);
                }
                Ok(AttributeValue::Map(map))
            }
            other => Err(CodecError::UnsupportedType(other.to_string())),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        AttributeValue::from_wire_json(&json).map_err(D::Error::custom)
    }
}

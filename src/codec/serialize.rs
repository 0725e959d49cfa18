//! Value <-> attribute-value conversion
//!
//! Both directions walk the same ordered rule table; the first rule that
//! matches decides the encoding. Three native values the union cannot tell
//! apart from ordinary data (NaN, the empty string, empty binary) are stored
//! as `Binary` carrying a fixed sentinel payload, and decoding checks those
//! payloads before the generic `Binary` rule.

use super::attribute::AttributeValue;
use super::errors::{CodecError, CodecResult};
use super::value::Value;

/// base64("NaN")
pub const NAN_SENTINEL: &[u8] = b"TmFO";
/// base64("EMPTY_STRING")
pub const EMPTY_STRING_SENTINEL: &[u8] = b"RU1QVFlfU1RSSU5H";
/// base64("EMPTY_BUFFER")
pub const EMPTY_BINARY_SENTINEL: &[u8] = b"RU1QVFlfQlVGRkVS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Null,
    NotANumber,
    EmptyBinary,
    EmptyString,
    String,
    Boolean,
    Number,
    Binary,
    List,
    Map,
}

const RULES: [Rule; 10] = [
    Rule::Null,
    Rule::NotANumber,
    Rule::EmptyBinary,
    Rule::EmptyString,
    Rule::String,
    Rule::Boolean,
    Rule::Number,
    Rule::Binary,
    Rule::List,
    Rule::Map,
];

fn is_sentinel(attr: &AttributeValue, sentinel: &[u8]) -> bool {
    matches!(attr, AttributeValue::Binary(bytes) if bytes.as_slice() == sentinel)
}

impl Rule {
    fn matches_native(self, value: &Value) -> bool {
        match self {
            Rule::Null => value.is_null(),
            Rule::NotANumber => matches!(value, Value::Number(n) if n.is_nan()),
            Rule::EmptyBinary => matches!(value, Value::Binary(b) if b.is_empty()),
            Rule::EmptyString => matches!(value, Value::String(s) if s.trim().is_empty()),
            Rule::String => matches!(value, Value::String(_)),
            Rule::Boolean => matches!(value, Value::Bool(_)),
            Rule::Number => matches!(value, Value::Number(_)),
            Rule::Binary => matches!(value, Value::Binary(_)),
            Rule::List => matches!(value, Value::List(_)),
            Rule::Map => matches!(value, Value::Map(_)),
        }
    }

    fn matches_wire(self, attr: &AttributeValue) -> bool {
        match self {
            Rule::Null => matches!(attr, AttributeValue::Null),
            Rule::NotANumber => is_sentinel(attr, NAN_SENTINEL),
            Rule::EmptyBinary => is_sentinel(attr, EMPTY_BINARY_SENTINEL),
            Rule::EmptyString => is_sentinel(attr, EMPTY_STRING_SENTINEL),
            Rule::String => matches!(attr, AttributeValue::String(_)),
            Rule::Boolean => matches!(attr, AttributeValue::Boolean(_)),
            Rule::Number => matches!(attr, AttributeValue::Number(_)),
            Rule::Binary => matches!(attr, AttributeValue::Binary(_)),
            Rule::List => matches!(attr, AttributeValue::List(_)),
            Rule::Map => matches!(attr, AttributeValue::Map(_)),
        }
    }

    fn encode(self, value: &Value) -> CodecResult<AttributeValue> {
        Ok(match (self, value) {
            (Rule::Null, _) => AttributeValue::Null,
            (Rule::NotANumber, _) => AttributeValue::Binary(NAN_SENTINEL.to_vec()),
            (Rule::EmptyBinary, _) => AttributeValue::Binary(EMPTY_BINARY_SENTINEL.to_vec()),
            (Rule::EmptyString, _) => AttributeValue::Binary(EMPTY_STRING_SENTINEL.to_vec()),
            (Rule::String, Value::String(s)) => AttributeValue::String(s.clone()),
            (Rule::Boolean, Value::Bool(b)) => AttributeValue::Boolean(*b),
            (Rule::Number, Value::Number(n)) => AttributeValue::Number(format_number(*n)),
            (Rule::Binary, Value::Binary(b)) => AttributeValue::Binary(b.clone()),
            (Rule::List, Value::List(items)) => AttributeValue::List(
                items.iter().map(serialize).collect::<CodecResult<Vec<_>>>()?,
            ),
            (Rule::Map, Value::Map(entries)) => {
                let mut out = std::collections::BTreeMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), serialize(v)?);
                }
                AttributeValue::Map(out)
            }
            (_, other) => return Err(CodecError::UnsupportedType(other.type_name().into())),
        })
    }

    fn decode(self, attr: &AttributeValue) -> CodecResult<Value> {
        Ok(match (self, attr) {
            (Rule::Null, _) => Value::Null,
            (Rule::NotANumber, _) => Value::Number(f64::NAN),
            (Rule::EmptyBinary, _) => Value::Binary(Vec::new()),
            (Rule::EmptyString, _) => Value::String(String::new()),
            (Rule::String, AttributeValue::String(s)) => Value::String(s.clone()),
            (Rule::Boolean, AttributeValue::Boolean(b)) => Value::Bool(*b),
            (Rule::Number, AttributeValue::Number(n)) => Value::Number(parse_number(n)?),
            (Rule::Binary, AttributeValue::Binary(b)) => Value::Binary(b.clone()),
            (Rule::List, AttributeValue::List(items)) => Value::List(
                items.iter().map(deserialize).collect::<CodecResult<Vec<_>>>()?,
            ),
            (Rule::Map, AttributeValue::Map(entries)) => {
                let mut out = std::collections::BTreeMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), deserialize(v)?);
                }
                Value::Map(out)
            }
            (_, other) => return Err(CodecError::UnsupportedType(other.tag().into())),
        })
    }
}

fn format_number(n: f64) -> String {
    // Display for f64 is the shortest string that parses back to the same bits
    format!("{}", n)
}

fn parse_number(text: &str) -> CodecResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| CodecError::InvalidNumber(text.to_string()))
}

/// Convert a native value into its attribute-value encoding
pub fn serialize(value: &Value) -> CodecResult<AttributeValue> {
    let rule = RULES
        .iter()
        .find(|r| r.matches_native(value))
        .ok_or_else(|| CodecError::UnsupportedType(value.type_name().into()))?;
    rule.encode(value)
}

/// Convert an attribute value back into a native value
pub fn deserialize(attr: &AttributeValue) -> CodecResult<Value> {
    let rule = RULES
        .iter()
        .find(|r| r.matches_wire(attr))
        .ok_or_else(|| CodecError::UnsupportedType(attr.tag().into()))?;
    rule.decode(attr)
}

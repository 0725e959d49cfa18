//! # Attribute Codec
//!
//! Converts native values to and from the backend's attribute-value union.
//! Pure and stateless: no I/O, identical output for identical input.

pub mod attribute;
pub mod bytes;
pub mod errors;
pub mod serialize;
pub mod value;

pub use attribute::AttributeValue;
pub use bytes::{cast_to_bytes, DataEncoding};
pub use errors::{CodecError, CodecResult};
pub use serialize::{
    deserialize, serialize, EMPTY_BINARY_SENTINEL, EMPTY_STRING_SENTINEL, NAN_SENTINEL,
};
pub use value::Value;

//! Record and write-request shapes

use serde::{Deserialize, Serialize};

use crate::codec::AttributeValue;

/// Wire name of the partition key field
pub const HASH_FIELD: &str = "hash";
/// Wire name of the sort key field
pub const RANGE_FIELD: &str = "range";
/// Wire name of the data attribute
pub const DATA_FIELD: &str = "data";

/// Primary key of one record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub hash: String,
    pub range: String,
}

impl ItemKey {
    pub fn new(hash: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            range: range.into(),
        }
    }
}

/// A stored record: `{ hash, range, data }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub hash: String,
    pub range: String,
    pub data: AttributeValue,
}

impl Item {
    pub fn new(key: ItemKey, data: AttributeValue) -> Self {
        Self {
            hash: key.hash,
            range: key.range,
            data,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.hash.clone(), self.range.clone())
    }
}

/// One entry of a batch write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteRequest {
    Put(Item),
    Delete(ItemKey),
}

impl WriteRequest {
    /// Sort key the request targets
    pub fn range_key(&self) -> &str {
        match self {
            WriteRequest::Put(item) => &item.range,
            WriteRequest::Delete(key) => &key.range,
        }
    }

    pub fn is_put(&self) -> bool {
        matches!(self, WriteRequest::Put(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_wire_shape() {
        let item = Item::new(
            ItemKey::new("!", "a"),
            AttributeValue::String("v".into()),
        );
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"hash": "!", "range": "a", "data": {"S": "v"}})
        );
    }

    #[test]
    fn test_range_key() {
        let put = WriteRequest::Put(Item::new(ItemKey::new("!", "a"), AttributeValue::Null));
        let del = WriteRequest::Delete(ItemKey::new("!", "b"));
        assert_eq!(put.range_key(), "a");
        assert_eq!(del.range_key(), "b");
        assert!(put.is_put());
        assert!(!del.is_put());
    }
}

//! Batch operations and last-write-wins de-duplication

use std::collections::HashSet;

use crate::codec::Value;

/// One write of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put { key: String, value: Value },
    Del { key: String },
}

impl BatchOp {
    pub fn put(key: impl Into<String>, value: impl Into<Value>) -> Self {
        BatchOp::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        BatchOp::Del { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Del { key } => key,
        }
    }

    pub fn is_put(&self) -> bool {
        matches!(self, BatchOp::Put { .. })
    }
}

/// Keep only the last op for each key, at the position of that last op.
pub fn dedupe(ops: Vec<BatchOp>) -> Vec<BatchOp> {
    let mut seen = HashSet::new();
    let mut kept: Vec<BatchOp> = ops
        .into_iter()
        .rev()
        .filter(|op| seen.insert(op.key().to_string()))
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let ops = vec![
            BatchOp::put("k", 1i64),
            BatchOp::del("k"),
            BatchOp::put("k", 2i64),
        ];
        assert_eq!(dedupe(ops), vec![BatchOp::put("k", 2i64)]);
    }

    #[test]
    fn test_position_of_last_op() {
        let ops = vec![
            BatchOp::put("a", 1i64),
            BatchOp::put("b", 1i64),
            BatchOp::del("a"),
            BatchOp::put("c", 1i64),
        ];
        let keys: Vec<String> = dedupe(ops).iter().map(|op| op.key().to_string()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_delete_wins_over_put() {
        let ops = vec![BatchOp::put("k", "v"), BatchOp::del("k")];
        let deduped = dedupe(ops);
        assert_eq!(deduped.len(), 1);
        assert!(!deduped[0].is_put());
    }
}

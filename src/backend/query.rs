//! Range query request and page shapes

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemKey};

/// Sort-key condition of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKeyCondition {
    Eq(String),
    Lt(String),
    Le(String),
    Gt(String),
    Ge(String),
    /// Inclusive on both ends
    Between(String, String),
}

impl SortKeyCondition {
    pub fn matches(&self, range: &str) -> bool {
        match self {
            SortKeyCondition::Eq(k) => range == k,
            SortKeyCondition::Lt(k) => range < k.as_str(),
            SortKeyCondition::Le(k) => range <= k.as_str(),
            SortKeyCondition::Gt(k) => range > k.as_str(),
            SortKeyCondition::Ge(k) => range >= k.as_str(),
            SortKeyCondition::Between(low, high) => range >= low.as_str() && range <= high.as_str(),
        }
    }
}

/// Opaque resume point returned with a page that has more to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken(ItemKey);

impl ContinuationToken {
    pub fn new(key: ItemKey) -> Self {
        Self(key)
    }

    /// Key of the last item evaluated
    pub fn key(&self) -> &ItemKey {
        &self.0
    }
}

/// One page request against a single partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub partition_key: String,
    /// `None` reads the whole partition
    pub condition: Option<SortKeyCondition>,
    pub scan_forward: bool,
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<ContinuationToken>,
    pub consistent_read: bool,
}

impl QueryRequest {
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            condition: None,
            scan_forward: true,
            limit: None,
            exclusive_start_key: None,
            consistent_read: false,
        }
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryPage {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<ContinuationToken>,
}

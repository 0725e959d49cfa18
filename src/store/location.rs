//! Location strings: `<table>$<partition>`

use std::fmt;

use crate::errors::{StoreError, StoreResult};

/// Partition used when the location names none
pub const DEFAULT_PARTITION: &str = "!";

/// Separator between table and partition
pub const LOCATION_SEPARATOR: char = '$';

/// Where a store's records live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Table name; also names the blob bucket
    pub table: String,
    pub partition: String,
}

impl Location {
    /// Parse `table` or `table$partition`.
    ///
    /// Everything after the first separator is the partition.
    pub fn parse(location: &str) -> StoreResult<Self> {
        let (table, partition) = match location.split_once(LOCATION_SEPARATOR) {
            Some((table, partition)) => (table, partition),
            None => (location, ""),
        };
        if table.trim().is_empty() {
            return Err(StoreError::InvalidLocation(format!(
                "Missing table name in '{}'",
                location
            )));
        }
        let partition = if partition.is_empty() {
            DEFAULT_PARTITION
        } else {
            partition
        };
        Ok(Self {
            table: table.to_string(),
            partition: partition.to_string(),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.table, LOCATION_SEPARATOR, self.partition)
    }
}

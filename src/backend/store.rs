//! # Primary Store Trait

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::errors::BackendResult;
use super::item::{Item, ItemKey, WriteRequest};
use super::query::{QueryPage, QueryRequest};

/// Boxed future returned by primary-store operations
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = BackendResult<T>> + Send + 'a>>;

/// Most requests a single batch write may carry
pub const MAX_BATCH_WRITE: usize = 25;

/// Most keys a single batch read may carry
pub const MAX_BATCH_GET: usize = 100;

/// Capacity mode a new table is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BillingMode {
    PayPerRequest,
    Provisioned {
        read_capacity: u64,
        write_capacity: u64,
    },
}

impl Default for BillingMode {
    fn default() -> Self {
        BillingMode::PayPerRequest
    }
}

impl BillingMode {
    /// Provisioned mode with 5 read and 5 write units
    pub fn provisioned() -> Self {
        BillingMode::Provisioned {
            read_capacity: 5,
            write_capacity: 5,
        }
    }
}

/// Capabilities the adapter needs from a sorted key-value table.
///
/// One store instance addresses one table keyed by (partition, sort key).
/// Every item-level call on a missing table fails with `ResourceNotFound`.
pub trait PrimaryStore: Send + Sync + std::fmt::Debug {
    /// Point read; `None` when the key is absent
    fn get<'a>(&'a self, key: &'a ItemKey, consistent_read: bool) -> BackendFuture<'a, Option<Item>>;

    /// Read up to `MAX_BATCH_GET` keys; absent keys are left out
    fn batch_get<'a>(&'a self, keys: &'a [ItemKey]) -> BackendFuture<'a, Vec<Item>>;

    fn put(&self, item: Item) -> BackendFuture<'_, ()>;

    fn delete<'a>(&'a self, key: &'a ItemKey) -> BackendFuture<'a, ()>;

    /// Apply up to `MAX_BATCH_WRITE` requests; returns the requests the
    /// store did not get to, which the caller must resubmit
    fn batch_write(&self, requests: Vec<WriteRequest>) -> BackendFuture<'_, Vec<WriteRequest>>;

    /// Read one page of a partition in sort-key order
    fn query<'a>(&'a self, request: &'a QueryRequest) -> BackendFuture<'a, QueryPage>;

    fn table_exists(&self) -> BackendFuture<'_, bool>;

    fn create_table(&self, billing: BillingMode) -> BackendFuture<'_, ()>;

    fn delete_table(&self) -> BackendFuture<'_, ()>;
}

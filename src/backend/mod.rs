//! # Primary Store
//!
//! The sorted key-value table records live in. The adapter only relies on
//! the `PrimaryStore` capabilities; `MemoryStore` is the in-process
//! implementation.

pub mod errors;
pub mod item;
pub mod memory;
pub mod query;
pub mod store;

pub use errors::{BackendError, BackendResult};
pub use item::{Item, ItemKey, WriteRequest, DATA_FIELD, HASH_FIELD, RANGE_FIELD};
pub use memory::MemoryStore;
pub use query::{ContinuationToken, QueryPage, QueryRequest, SortKeyCondition};
pub use store::{BackendFuture, BillingMode, PrimaryStore, MAX_BATCH_GET, MAX_BATCH_WRITE};

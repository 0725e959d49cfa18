//! dynadown - a LevelDB-style ordered key-value store layered over a
//! partitioned sorted table, with large fields split out to a blob store
//!
//! Layers, bottom-up:
//! - `codec`: native values to and from the table's attribute format
//! - `attachment`: pattern-driven extraction and restoration of blob fields
//! - `blob` / `backend`: the two storage collaborators behind traits
//! - `batch` / `iterator`: batched writes with retry, ranged reads with paging
//! - `store`: the `DynaDown` facade

pub mod attachment;
pub mod backend;
pub mod batch;
pub mod blob;
pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod iterator;
pub mod observability;
pub mod store;

pub use batch::BatchOp;
pub use codec::Value;
pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use iterator::{Entry, IteratorOptions};
pub use store::{DynaDown, Location, OpenOptions};

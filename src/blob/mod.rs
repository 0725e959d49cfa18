//! # Blob Store
//!
//! Payload storage for externalized attachments, addressed by key path.

pub mod backend;
pub mod batch;
pub mod errors;
pub mod local;
pub mod memory;

pub use backend::{BlobFuture, BlobObject, BlobStore, FetchedAttachments};
pub use batch::{delete_batch, get_batch, put_batch};
pub use errors::{BlobError, BlobResult};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

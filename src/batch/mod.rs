//! # Batched Writes
//!
//! LevelDB-style batches applied through the backend's bounded batch call.

pub mod ops;
pub mod retry;
pub mod writer;

pub use ops::{dedupe, BatchOp};
pub use retry::RetryPolicy;
pub use writer::BatchWriter;

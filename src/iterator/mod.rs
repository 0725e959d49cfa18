//! # Range Iteration
//!
//! LevelDB iterator semantics over a partition's sort keys.

pub mod cursor;
pub mod options;
pub mod range;

pub use cursor::{Entry, RangeIterator};
pub use options::IteratorOptions;
pub use range::KeyRange;

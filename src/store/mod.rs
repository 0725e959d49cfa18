//! # Store
//!
//! `DynaDown` ties the codec, attachments, blob store, batched writer and
//! range iterator together behind a LevelDB-shaped API.

pub mod dynadown;
pub mod location;
pub mod options;

pub use dynadown::DynaDown;
pub use location::{Location, DEFAULT_PARTITION, LOCATION_SEPARATOR};
pub use options::OpenOptions;

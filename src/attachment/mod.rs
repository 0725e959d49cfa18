//! # Attachments
//!
//! Oversized subtrees of a value are moved to the blob store before a write
//! and put back after a read:
//!
//! 1. `extract` replaces each matching subtree with a pointer and returns
//!    the payloads to upload
//! 2. `extract_pointers` lists the pointers in a stored record, which drives
//!    both stale-blob cleanup and restoration
//! 3. `restore` swaps pointers for the fetched payloads
//!
//! Everything here is pure; blob I/O belongs to the caller.

pub mod definition;
pub mod extractor;
mod path;
pub mod pointer;
pub mod restorer;

pub use definition::{Attachment, AttachmentDefinition};
pub use extractor::{extract, stale_keys, Extraction};
pub use pointer::{extract_pointers, AttachmentPointer, PointerMap, POINTER_FIELD};
pub use restorer::restore;

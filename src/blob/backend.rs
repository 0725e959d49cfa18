//! # Blob Store Trait

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use super::errors::BlobResult;

/// Boxed future returned by blob store operations
pub type BlobFuture<'a, T> = Pin<Box<dyn Future<Output = BlobResult<T>> + Send + 'a>>;

/// An object read back from the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Fetched objects keyed by blob key
pub type FetchedAttachments = HashMap<String, BlobObject>;

/// Backend trait for attachment payload storage.
///
/// One store instance addresses one bucket.
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Write an object, replacing any previous body
    fn put_object<'a>(
        &'a self,
        key: &'a str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> BlobFuture<'a, ()>;

    /// Read an object
    fn get_object<'a>(&'a self, key: &'a str) -> BlobFuture<'a, BlobObject>;

    /// Delete an object; deleting a missing object succeeds
    fn delete_object<'a>(&'a self, key: &'a str) -> BlobFuture<'a, ()>;

    /// Check whether the bucket exists
    fn bucket_exists(&self) -> BlobFuture<'_, bool>;

    /// Create the bucket
    fn create_bucket(&self) -> BlobFuture<'_, ()>;

    /// Delete the bucket and everything in it
    fn delete_bucket(&self) -> BlobFuture<'_, ()>;
}

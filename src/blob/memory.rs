//! # In-Memory Blob Store

use std::collections::HashMap;
use std::sync::RwLock;

use super::backend::{BlobFuture, BlobObject, BlobStore};
use super::errors::{BlobError, BlobResult};

/// Blob store held entirely in process memory.
///
/// `None` means the bucket does not exist.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    bucket: RwLock<Option<HashMap<String, BlobObject>>>,
}

impl MemoryBlobStore {
    /// Create a store whose bucket does not exist yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an empty bucket
    pub fn with_bucket() -> Self {
        Self {
            bucket: RwLock::new(Some(HashMap::new())),
        }
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bucket
            .read()
            .ok()
            .and_then(|b| b.as_ref().map(|objects| objects.keys().cloned().collect()))
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn with_objects<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, BlobObject>) -> BlobResult<T>,
    ) -> BlobResult<T> {
        let mut bucket = self
            .bucket
            .write()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        match bucket.as_mut() {
            Some(objects) => f(objects),
            None => Err(BlobError::BucketNotFound("memory".into())),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn put_object<'a>(
        &'a self,
        key: &'a str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> BlobFuture<'a, ()> {
        let result = self.with_objects(|objects| {
            objects.insert(key.to_string(), BlobObject { data, content_type });
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn get_object<'a>(&'a self, key: &'a str) -> BlobFuture<'a, BlobObject> {
        let result = self.with_objects(|objects| {
            objects
                .get(key)
                .cloned()
                .ok_or_else(|| BlobError::ObjectNotFound(key.to_string()))
        });
        Box::pin(async move { result })
    }

    fn delete_object<'a>(&'a self, key: &'a str) -> BlobFuture<'a, ()> {
        let result = self.with_objects(|objects| {
            objects.remove(key);
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn bucket_exists(&self) -> BlobFuture<'_, bool> {
        let result = self
            .bucket
            .read()
            .map(|b| b.is_some())
            .map_err(|_| BlobError::Internal("Lock poisoned".into()));
        Box::pin(async move { result })
    }

    fn create_bucket(&self) -> BlobFuture<'_, ()> {
        let result = self
            .bucket
            .write()
            .map(|mut b| {
                b.get_or_insert_with(HashMap::new);
            })
            .map_err(|_| BlobError::Internal("Lock poisoned".into()));
        Box::pin(async move { result })
    }

    fn delete_bucket(&self) -> BlobFuture<'_, ()> {
        let result = self
            .bucket
            .write()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))
            .and_then(|mut b| match b.take() {
                Some(_) => Ok(()),
                None => Err(BlobError::BucketNotFound("memory".into())),
            });
        Box::pin(async move { result })
    }
}

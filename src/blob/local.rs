//! # Local Filesystem Blob Store
//!
//! Layout under `<root>/<bucket>/`:
//! - `objects/<key>`: object body
//! - `meta/<key>.json`: content type, size and SHA-256 checksum

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use super::backend::{BlobFuture, BlobObject, BlobStore};
use super::errors::{BlobError, BlobResult};

/// Metadata stored next to each object
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobMetadata {
    content_type: Option<String>,
    size: u64,
    checksum: String,
}

/// Calculate the hex SHA-256 checksum of a payload
pub fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Filesystem-backed blob store
#[derive(Debug)]
pub struct LocalBlobStore {
    bucket_dir: PathBuf,
}

impl LocalBlobStore {
    /// Create a store for `bucket` under `root`
    pub fn new(root: impl Into<PathBuf>, bucket: &str) -> Self {
        Self {
            bucket_dir: root.into().join(bucket),
        }
    }

    fn validate_key(key: &str) -> BlobResult<()> {
        if key.is_empty() {
            return Err(BlobError::InvalidPath(key.to_string()));
        }
        let escapes = Path::new(key)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(BlobError::InvalidPath(key.to_string()));
        }
        Ok(())
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.bucket_dir.join("objects").join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.bucket_dir.join("meta").join(format!("{}.json", key))
    }

    async fn ensure_bucket(&self) -> BlobResult<()> {
        if fs::metadata(&self.bucket_dir).await.is_err() {
            return Err(BlobError::BucketNotFound(
                self.bucket_dir.display().to_string(),
            ));
        }
        Ok(())
    }

    async fn write_file(path: &Path, data: &[u8]) -> BlobResult<()> {
        // Create parent directories
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn remove_file(path: &Path) -> BlobResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for LocalBlobStore {
    fn put_object<'a>(
        &'a self,
        key: &'a str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> BlobFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;
            self.ensure_bucket().await?;

            let metadata = BlobMetadata {
                content_type,
                size: data.len() as u64,
                checksum: calculate_checksum(&data),
            };
            let meta_bytes = serde_json::to_vec(&metadata)
                .map_err(|e| BlobError::Internal(e.to_string()))?;

            Self::write_file(&self.object_path(key), &data).await?;
            Self::write_file(&self.meta_path(key), &meta_bytes).await
        })
    }

    fn get_object<'a>(&'a self, key: &'a str) -> BlobFuture<'a, BlobObject> {
        Box::pin(async move {
            Self::validate_key(key)?;
            self.ensure_bucket().await?;

            let data = fs::read(self.object_path(key)).await.map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    BlobError::ObjectNotFound(key.to_string())
                } else {
                    BlobError::IoError(e.to_string())
                }
            })?;
            let meta_bytes = fs::read(self.meta_path(key)).await.map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    BlobError::ObjectNotFound(key.to_string())
                } else {
                    BlobError::IoError(e.to_string())
                }
            })?;
            let metadata: BlobMetadata = serde_json::from_slice(&meta_bytes)
                .map_err(|e| BlobError::Internal(format!("corrupt metadata for {}: {}", key, e)))?;

            if calculate_checksum(&data) != metadata.checksum {
                return Err(BlobError::ChecksumMismatch(key.to_string()));
            }

            Ok(BlobObject {
                data,
                content_type: metadata.content_type,
            })
        })
    }

    fn delete_object<'a>(&'a self, key: &'a str) -> BlobFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;
            self.ensure_bucket().await?;
            Self::remove_file(&self.object_path(key)).await?;
            Self::remove_file(&self.meta_path(key)).await
        })
    }

    fn bucket_exists(&self) -> BlobFuture<'_, bool> {
        Box::pin(async move { Ok(fs::metadata(&self.bucket_dir).await.is_ok()) })
    }

    fn create_bucket(&self) -> BlobFuture<'_, ()> {
        Box::pin(async move {
            fs::create_dir_all(&self.bucket_dir).await?;
            Ok(())
        })
    }

    fn delete_bucket(&self) -> BlobFuture<'_, ()> {
        Box::pin(async move {
            match fs::remove_dir_all(&self.bucket_dir).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::BucketNotFound(
                    self.bucket_dir.display().to_string(),
                )),
                Err(e) => Err(e.into()),
            }
        })
    }
}

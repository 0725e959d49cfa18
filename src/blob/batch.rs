//! Concurrent fan-out of single-object blob calls

use futures_util::future::try_join_all;

use crate::attachment::Attachment;

use super::backend::{BlobStore, FetchedAttachments};
use super::errors::BlobResult;

/// Write every attachment concurrently
pub async fn put_batch(store: &dyn BlobStore, attachments: &[Attachment]) -> BlobResult<()> {
    try_join_all(
        attachments
            .iter()
            .map(|a| store.put_object(&a.key, a.data.clone(), a.content_type.clone())),
    )
    .await?;
    Ok(())
}

/// Fetch every key concurrently.
///
/// Missing objects are left out of the result; any other failure aborts the batch.
pub async fn get_batch(store: &dyn BlobStore, keys: &[String]) -> BlobResult<FetchedAttachments> {
    let fetched = try_join_all(keys.iter().map(|key| async move {
        match store.get_object(key).await {
            Ok(object) => Ok(Some((key.clone(), object))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }))
    .await?;
    Ok(fetched.into_iter().flatten().collect())
}

/// Delete every key concurrently
pub async fn delete_batch(store: &dyn BlobStore, keys: &[String]) -> BlobResult<()> {
    try_join_all(keys.iter().map(|key| store.delete_object(key))).await?;
    Ok(())
}

//! # DynaDown
//!
//! A LevelDB-style store over one partition of a primary table, with
//! attachment payloads kept in a blob bucket named after the table.
//!
//! Write path: read the prior copies, extract attachments, upload new
//! blobs and delete stale ones (both awaited), then write the records.
//! Read path: fetch the record, then fetch and restore its attachments.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::TryFutureExt;

use crate::attachment::{
    extract, extract_pointers, restore, stale_keys, Attachment, AttachmentDefinition,
};
use crate::backend::{BackendError, BillingMode, Item, ItemKey, PrimaryStore, MAX_BATCH_GET};
use crate::batch::{dedupe, BatchOp, BatchWriter, RetryPolicy};
use crate::blob::{delete_batch, get_batch, put_batch, BlobError, BlobStore};
use crate::codec::{deserialize, serialize, Value};
use crate::config::StoreConfig;
use crate::errors::{StoreError, StoreResult};
use crate::iterator::{IteratorOptions, RangeIterator};
use crate::observability::{
    log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot, ObservationScope,
};

use super::location::Location;
use super::options::OpenOptions;

/// Resolve a scope from an operation result.
///
/// A missing key is an ordinary outcome of a read and is not logged as a
/// failure.
fn finish<T>(scope: ObservationScope, result: StoreResult<T>) -> StoreResult<T> {
    match &result {
        Ok(_) => scope.complete(),
        Err(e) if e.is_not_found() => scope.complete_with_fields(&[("found", "false")]),
        Err(e) => scope.fail(e.code(), &e.to_string()),
    }
    result
}

/// One upload per blob key, the last in definition order. Concurrent
/// writes to one key must never reach the blob store.
fn last_per_key(uploads: Vec<Attachment>) -> Vec<Attachment> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Attachment> = uploads
        .into_iter()
        .rev()
        .filter(|a| seen.insert(a.key.clone()))
        .collect();
    kept.reverse();
    kept
}

#[derive(Debug)]
pub struct DynaDown {
    location: Location,
    primary: Arc<dyn PrimaryStore>,
    blobs: Arc<dyn BlobStore>,
    definitions: Vec<AttachmentDefinition>,
    consistent_read: bool,
    billing: BillingMode,
    writer: BatchWriter,
    metrics: Arc<MetricsRegistry>,
    open: AtomicBool,
}

impl DynaDown {
    pub fn new(
        location: &str,
        primary: Arc<dyn PrimaryStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> StoreResult<Self> {
        let location = Location::parse(location)?;
        let metrics = Arc::new(MetricsRegistry::new());
        let writer = BatchWriter::new(primary.clone(), location.partition.clone())
            .with_metrics(metrics.clone());
        Ok(Self {
            location,
            primary,
            blobs,
            definitions: Vec::new(),
            consistent_read: false,
            billing: BillingMode::default(),
            writer,
            metrics,
            open: AtomicBool::new(false),
        })
    }

    /// Build a store with every setting taken from `config`
    pub fn from_config(
        config: &StoreConfig,
        primary: Arc<dyn PrimaryStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self::new(&config.location, primary, blobs)?
            .with_attachments(config.definitions()?)
            .with_consistent_read(config.use_consistency)
            .with_billing_mode(config.billing_mode)
            .with_max_batch_size(config.max_batch_size)
            .with_retry(config.retry))
    }

    /// Attachment definitions, tried in order
    pub fn with_attachments(mut self, definitions: Vec<AttachmentDefinition>) -> Self {
        self.definitions = definitions;
        self
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    /// Billing mode used if `open` creates the table
    pub fn with_billing_mode(mut self, billing: BillingMode) -> Self {
        self.billing = billing;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.writer = self.writer.with_max_batch_size(size);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.writer = self.writer.with_retry(retry);
        self
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::NotOpen)
        }
    }

    fn item_key(&self, key: &str) -> ItemKey {
        ItemKey::new(self.location.partition.clone(), key)
    }

    /// Check the table and bucket, creating whichever is missing when
    /// `create_if_missing` is set.
    pub async fn open(&self, options: OpenOptions) -> StoreResult<()> {
        let (table_exists, bucket_exists) = tokio::try_join!(
            self.primary.table_exists().map_err(StoreError::from),
            self.blobs.bucket_exists().map_err(StoreError::from),
        )?;

        if options.error_if_exists && (table_exists || bucket_exists) {
            return Err(StoreError::StorageExists(self.location.table.clone()));
        }

        if options.create_if_missing {
            tokio::try_join!(
                self.ensure_table(table_exists),
                self.ensure_bucket(bucket_exists),
            )?;
        } else if !table_exists || !bucket_exists {
            return Err(StoreError::StorageMissing(self.location.table.clone()));
        }

        self.open.store(true, Ordering::Release);
        let location = self.location.to_string();
        log_event_with_fields(Event::StoreOpen, &[("location", location.as_str())]);
        Ok(())
    }

    async fn ensure_table(&self, exists: bool) -> StoreResult<()> {
        if exists {
            return Ok(());
        }
        match self.primary.create_table(self.billing).await {
            Ok(()) => {
                log_event_with_fields(Event::TableCreated, &[("table", self.location.table.as_str())]);
                Ok(())
            }
            // Created concurrently by another opener
            Err(BackendError::ResourceInUse(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_bucket(&self, exists: bool) -> StoreResult<()> {
        if exists {
            return Ok(());
        }
        self.blobs.create_bucket().await?;
        log_event_with_fields(Event::BucketCreated, &[("bucket", self.location.table.as_str())]);
        Ok(())
    }

    pub async fn close(&self) -> StoreResult<()> {
        self.open.store(false, Ordering::Release);
        let location = self.location.to_string();
        log_event_with_fields(Event::StoreClosed, &[("location", location.as_str())]);
        Ok(())
    }

    /// Drop the table and bucket together. Storage that is already gone
    /// counts as destroyed.
    pub async fn destroy(&self) -> StoreResult<()> {
        let (table, bucket) = tokio::join!(self.primary.delete_table(), self.blobs.delete_bucket());
        match table {
            Ok(()) | Err(BackendError::ResourceNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        match bucket {
            Ok(()) | Err(BlobError::BucketNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        self.open.store(false, Ordering::Release);
        log_event_with_fields(Event::StoreDestroyed, &[("table", self.location.table.as_str())]);
        Ok(())
    }

    pub async fn put(&self, key: &str, value: Value) -> StoreResult<()> {
        self.ensure_open()?;
        let scope = ObservationScope::with_fields("PUT", vec![("key", key.to_string())]);
        let result = self.put_record(key, value).await;
        finish(scope, result)
    }

    async fn put_record(&self, key: &str, value: Value) -> StoreResult<()> {
        let puts = vec![(key.to_string(), value)];
        let priors = self.read_priors(&[key.to_string()]).await?;
        for (key, value) in self.sync_attachments(puts, &priors).await? {
            let item = Item::new(self.item_key(&key), serialize(&value)?);
            self.primary.put(item).await?;
        }
        self.metrics.add_puts(1);
        Ok(())
    }

    /// Read a record and restore its attachments. An absent key is
    /// `StoreError::NotFound`.
    pub async fn get(&self, key: &str) -> StoreResult<Value> {
        self.ensure_open()?;
        let scope = ObservationScope::with_fields("GET", vec![("key", key.to_string())]);
        let result = self.get_record(key).await;
        finish(scope, result)
    }

    async fn get_record(&self, key: &str) -> StoreResult<Value> {
        self.metrics.increment_gets();
        let item = self
            .primary
            .get(&self.item_key(key), self.consistent_read)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let value = deserialize(&item.data)?;

        let pointers = extract_pointers(key, &value);
        if pointers.is_empty() {
            return Ok(value);
        }

        let blob_keys = pointers.blob_keys();
        let fetched = get_batch(self.blobs.as_ref(), &blob_keys).await?;
        self.metrics.add_blobs_fetched(fetched.len() as u64);
        if fetched.len() < blob_keys.len() {
            let missing = (blob_keys.len() - fetched.len()).to_string();
            log_event_with_fields(
                Event::AttachmentMissing,
                &[("key", key), ("missing", missing.as_str())],
            );
        }

        Ok(restore(value, Some(&pointers), Some(&fetched), &self.definitions))
    }

    /// Delete a record and the blobs it points to
    pub async fn del(&self, key: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let scope = ObservationScope::with_fields("DEL", vec![("key", key.to_string())]);
        let result = self.del_record(key).await;
        finish(scope, result)
    }

    async fn del_record(&self, key: &str) -> StoreResult<()> {
        let priors = self.read_priors(&[key.to_string()]).await?;
        self.release_attachments(&priors).await?;
        self.primary.delete(&self.item_key(key)).await?;
        self.metrics.add_deletes(1);
        Ok(())
    }

    /// Apply `ops` with last-write-wins per key
    pub async fn batch(&self, ops: Vec<BatchOp>) -> StoreResult<()> {
        self.ensure_open()?;
        let scope = ObservationScope::with_fields("BATCH", vec![("ops", ops.len().to_string())]);
        let result = self.apply_batch(ops).await;
        finish(scope, result)
    }

    async fn apply_batch(&self, ops: Vec<BatchOp>) -> StoreResult<()> {
        let mut order = Vec::new();
        let mut puts = Vec::new();
        let mut dels = Vec::new();
        for op in dedupe(ops) {
            match op {
                BatchOp::Put { key, value } => {
                    order.push(true);
                    puts.push((key, value));
                }
                BatchOp::Del { key } => {
                    order.push(false);
                    dels.push(key);
                }
            }
        }
        let (put_count, del_count) = (puts.len() as u64, dels.len() as u64);

        // One read of every prior copy, shared by both paths
        let keys: Vec<String> = puts
            .iter()
            .map(|(key, _)| key.clone())
            .chain(dels.iter().cloned())
            .collect();
        let priors = self.read_priors(&keys).await?;
        let (put_priors, del_priors): (HashMap<String, Value>, HashMap<String, Value>) =
            priors.into_iter().partition(|(key, _)| !dels.contains(key));

        let (stripped, _) = tokio::try_join!(
            self.sync_attachments(puts, &put_priors),
            self.release_attachments(&del_priors),
        )?;

        let mut stripped = stripped.into_iter();
        let mut dels = dels.into_iter();
        let ops: Vec<BatchOp> = order
            .into_iter()
            .filter_map(|is_put| {
                if is_put {
                    stripped.next().map(|(key, value)| BatchOp::Put { key, value })
                } else {
                    dels.next().map(|key| BatchOp::Del { key })
                }
            })
            .collect();

        self.writer.commit(ops).await?;
        self.metrics.add_puts(put_count);
        self.metrics.add_deletes(del_count);
        Ok(())
    }

    /// Open a cursor over this store's partition
    pub fn iterator(&self, options: &IteratorOptions) -> StoreResult<RangeIterator> {
        self.ensure_open()?;
        Ok(RangeIterator::new(self.primary.clone(), self.location.partition.clone(), options)
            .with_consistent_read(self.consistent_read)
            .with_metrics(self.metrics.clone()))
    }

    /// Decoded stored copies of `keys`, as currently in the table.
    /// Chunks go to the primary store one call at a time.
    async fn read_priors(&self, keys: &[String]) -> StoreResult<HashMap<String, Value>> {
        let item_keys: Vec<ItemKey> = keys.iter().map(|k| self.item_key(k)).collect();
        let mut priors = HashMap::with_capacity(keys.len());
        for chunk in item_keys.chunks(MAX_BATCH_GET) {
            for item in self.primary.batch_get(chunk).await? {
                let value = deserialize(&item.data)?;
                priors.insert(item.range, value);
            }
        }
        Ok(priors)
    }

    /// Move attachments of `puts` into the blob store and drop blobs the
    /// prior copies referenced but the new values do not. Returns the
    /// values to store, in input order.
    async fn sync_attachments(
        &self,
        puts: Vec<(String, Value)>,
        priors: &HashMap<String, Value>,
    ) -> StoreResult<Vec<(String, Value)>> {
        if puts.is_empty() {
            return Ok(puts);
        }

        let mut uploads = Vec::new();
        let mut stale = Vec::new();
        let mut stripped = Vec::with_capacity(puts.len());
        for (key, value) in puts {
            let extraction = extract(&key, &value, &self.definitions)?;
            if let Some(prior) = priors.get(&key) {
                stale.extend(stale_keys(&extract_pointers(&key, prior), &extraction));
            }
            uploads.extend(extraction.attachments);
            stripped.push((key, extraction.value));
        }
        let uploads = last_per_key(uploads);

        if !uploads.is_empty() || !stale.is_empty() {
            tokio::try_join!(
                put_batch(self.blobs.as_ref(), &uploads).map_err(StoreError::from),
                delete_batch(self.blobs.as_ref(), &stale).map_err(StoreError::from),
            )?;
            self.metrics.add_blobs_written(uploads.len() as u64);
            self.metrics.add_blobs_deleted(stale.len() as u64);

            let (written, deleted) = (uploads.len().to_string(), stale.len().to_string());
            log_event_with_fields(
                Event::AttachmentsSynced,
                &[("deleted", deleted.as_str()), ("written", written.as_str())],
            );
        }

        Ok(stripped)
    }

    /// Delete every blob the given stored copies point to
    async fn release_attachments(&self, priors: &HashMap<String, Value>) -> StoreResult<()> {
        let blob_keys: Vec<String> = priors
            .iter()
            .flat_map(|(key, value)| extract_pointers(key, value).blob_keys())
            .collect();
        if blob_keys.is_empty() {
            return Ok(());
        }

        delete_batch(self.blobs.as_ref(), &blob_keys).await?;
        self.metrics.add_blobs_deleted(blob_keys.len() as u64);
        Ok(())
    }
}

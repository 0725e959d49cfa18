//! # Range Iterator
//!
//! Ordered iteration over one partition, reconstructed from paged
//! sort-key queries.
//!
//! Pages are pulled lazily: the first `next()` issues the first query and
//! later calls fetch again once the buffer drains, passing the
//! continuation token along. Each request asks for at most the remaining
//! quota. The backend condition may be wider than the requested range, so
//! every fetched item is checked against the range before it is buffered.
//!
//! `seek` is applied lazily as well: the next `next()` discards buffered
//! items short of the target before yielding.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::stream::{self, Stream};

use crate::backend::{BackendError, ContinuationToken, Item, PrimaryStore, QueryRequest};
use crate::codec::{deserialize, Value};
use crate::errors::StoreResult;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::options::IteratorOptions;
use super::range::KeyRange;

/// One yielded pair, projected per the options
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Option<String>,
    pub value: Option<Value>,
}

/// Cursor over one partition's sort keys.
///
/// Construction issues no query: the first page is fetched by the first
/// `next()`, so writes made between opening and the first pull are visible.
#[derive(Debug)]
pub struct RangeIterator {
    store: Arc<dyn PrimaryStore>,
    partition: String,
    range: KeyRange,
    reverse: bool,
    limit: Option<usize>,
    keys: bool,
    values: bool,
    consistent_read: bool,
    metrics: Arc<MetricsRegistry>,

    buffer: VecDeque<Item>,
    token: Option<ContinuationToken>,
    /// The backend may still hold items past the buffer
    more: bool,
    yielded: usize,
    pending_seek: Option<String>,
    out_of_range: bool,
    closed: bool,
}

impl RangeIterator {
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        partition: impl Into<String>,
        options: &IteratorOptions,
    ) -> Self {
        let range = KeyRange::from_options(options);
        let more = !range.is_empty() && options.limit != Some(0);
        Self {
            store,
            partition: partition.into(),
            range,
            reverse: options.reverse,
            limit: options.limit,
            keys: options.keys,
            values: options.values,
            consistent_read: false,
            metrics: Arc::new(MetricsRegistry::new()),
            buffer: VecDeque::new(),
            token: None,
            more,
            yielded: 0,
            pending_seek: None,
            out_of_range: false,
            closed: false,
        }
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    /// Next entry, or `None` once the range, the quota or the partition is
    /// exhausted
    pub async fn next(&mut self) -> StoreResult<Option<Entry>> {
        if self.closed {
            return Ok(None);
        }
        if let Some(target) = self.pending_seek.take() {
            self.skip_to(&target).await?;
        }
        if self.out_of_range || self.quota_reached() {
            return Ok(None);
        }

        if self.peek().await?.is_none() {
            return Ok(None);
        }
        match self.buffer.pop_front() {
            Some(item) => {
                self.yielded += 1;
                self.project(item).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Position the cursor at the first key at or past `target` (at or
    /// before it in reverse). A target outside the range ends the
    /// iteration until a later seek lands inside it.
    pub fn seek(&mut self, target: impl Into<String>) {
        let target = target.into();
        self.out_of_range = !self.range.contains(&target);
        self.pending_seek = if self.out_of_range { None } else { Some(target) };
    }

    /// Release the cursor; no backend call is needed
    pub fn close(&mut self) {
        self.closed = true;
        self.more = false;
        self.buffer.clear();
        self.token = None;
        self.pending_seek = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drain the cursor as a stream; the stream ends after the first error
    pub fn into_stream(self) -> impl Stream<Item = StoreResult<Entry>> {
        stream::unfold(self, |mut cursor| async move {
            if cursor.closed {
                return None;
            }
            match cursor.next().await {
                Ok(Some(entry)) => Some((Ok(entry), cursor)),
                Ok(None) => None,
                Err(e) => {
                    cursor.close();
                    Some((Err(e), cursor))
                }
            }
        })
    }

    fn quota_reached(&self) -> bool {
        self.limit.map_or(false, |limit| self.yielded >= limit)
    }

    fn is_before(&self, key: &str, target: &str) -> bool {
        if self.reverse {
            key > target
        } else {
            key < target
        }
    }

    async fn skip_to(&mut self, target: &str) -> StoreResult<()> {
        while let Some(key) = self.peek().await? {
            if !self.is_before(&key, target) {
                break;
            }
            self.buffer.pop_front();
        }
        Ok(())
    }

    /// Key of the next buffered item, fetching pages until one is
    /// available or the backend runs dry
    async fn peek(&mut self) -> StoreResult<Option<String>> {
        loop {
            if let Some(item) = self.buffer.front() {
                return Ok(Some(item.range.clone()));
            }
            if !self.fetch_page().await? {
                return Ok(None);
            }
        }
    }

    /// Pull one page into the buffer; false when there is nothing left to pull
    async fn fetch_page(&mut self) -> StoreResult<bool> {
        if !self.more {
            return Ok(false);
        }
        let remaining = match self.limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(self.yielded + self.buffer.len());
                if remaining == 0 {
                    self.more = false;
                    return Ok(false);
                }
                Some(remaining)
            }
            None => None,
        };

        let request = QueryRequest {
            partition_key: self.partition.clone(),
            condition: self.range.condition(),
            scan_forward: !self.reverse,
            limit: remaining,
            exclusive_start_key: self.token.take(),
            consistent_read: self.consistent_read,
        };

        let page = match self.store.query(&request).await {
            Ok(page) => page,
            Err(BackendError::ResourceNotFound(message)) => {
                log_event_with_fields(
                    Event::ScanTableMissing,
                    &[
                        ("partition", self.partition.as_str()),
                        ("reason", message.as_str()),
                    ],
                );
                self.more = false;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        self.metrics.increment_query_pages();
        self.more = page.last_evaluated_key.is_some();
        self.token = page.last_evaluated_key;
        let range = &self.range;
        self.buffer
            .extend(page.items.into_iter().filter(|item| range.contains(&item.range)));
        Ok(true)
    }

    fn project(&self, item: Item) -> StoreResult<Entry> {
        let value = if self.values {
            Some(deserialize(&item.data)?)
        } else {
            None
        };
        let key = if self.keys { Some(item.range) } else { None };
        Ok(Entry { key, value })
    }
}

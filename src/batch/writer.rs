//! # Batched Writer
//!
//! Commits an arbitrarily large write set through a backend that accepts a
//! bounded number of requests per call and may hand some of them back.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::backend::{Item, ItemKey, PrimaryStore, WriteRequest, MAX_BATCH_WRITE};
use crate::codec::serialize;
use crate::errors::{StoreError, StoreResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::ops::{dedupe, BatchOp};
use super::retry::RetryPolicy;

/// Writes batches of ops into one partition
#[derive(Debug, Clone)]
pub struct BatchWriter {
    store: Arc<dyn PrimaryStore>,
    partition: String,
    max_batch_size: usize,
    retry: RetryPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn PrimaryStore>, partition: impl Into<String>) -> Self {
        Self {
            store,
            partition: partition.into(),
            max_batch_size: MAX_BATCH_WRITE,
            retry: RetryPolicy::default(),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Requests per backend call, clamped to 1..=25
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.clamp(1, MAX_BATCH_WRITE);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// De-duplicate, encode and write `ops`.
    ///
    /// Fails on the first encoding or backend error; requests already
    /// accepted by the backend stay written.
    pub async fn commit(&self, ops: Vec<BatchOp>) -> StoreResult<()> {
        let requests = dedupe(ops)
            .into_iter()
            .map(|op| self.encode(op))
            .collect::<StoreResult<Vec<_>>>()?;
        self.write_requests(requests).await
    }

    fn encode(&self, op: BatchOp) -> StoreResult<WriteRequest> {
        Ok(match op {
            BatchOp::Put { key, value } => WriteRequest::Put(Item {
                hash: self.partition.clone(),
                range: key,
                data: serialize(&value)?,
            }),
            BatchOp::Del { key } => WriteRequest::Delete(ItemKey::new(self.partition.clone(), key)),
        })
    }

    /// Send already-encoded requests, resubmitting unprocessed ones ahead of
    /// everything not yet sent.
    pub async fn write_requests(&self, requests: Vec<WriteRequest>) -> StoreResult<()> {
        let total = requests.len();
        let mut pending: VecDeque<WriteRequest> = requests.into();
        let mut calls = 0usize;
        let mut attempt = 0u32;

        while !pending.is_empty() {
            let take = pending.len().min(self.max_batch_size);
            let chunk: Vec<WriteRequest> = pending.drain(..take).collect();

            self.metrics.increment_batch_requests();
            calls += 1;
            let unprocessed = self.store.batch_write(chunk).await?;

            if unprocessed.is_empty() {
                attempt = 0;
                continue;
            }

            attempt += 1;
            let returned = unprocessed.len();
            self.metrics.add_unprocessed_retries(returned as u64);
            for request in unprocessed.into_iter().rev() {
                pending.push_front(request);
            }

            if !self.retry.allows(attempt) {
                let remaining = pending.len().to_string();
                log_event_with_fields(
                    Event::BatchAbandoned,
                    &[
                        ("partition", self.partition.as_str()),
                        ("remaining", remaining.as_str()),
                    ],
                );
                return Err(StoreError::RetriesExhausted {
                    remaining: pending.len(),
                });
            }

            let (returned, attempt_str) = (returned.to_string(), attempt.to_string());
            log_event_with_fields(
                Event::BatchRetry,
                &[
                    ("attempt", attempt_str.as_str()),
                    ("partition", self.partition.as_str()),
                    ("unprocessed", returned.as_str()),
                ],
            );

            let wait = self.retry.backoff(attempt);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }

        let (total, calls) = (total.to_string(), calls.to_string());
        log_event_with_fields(
            Event::BatchCommit,
            &[
                ("calls", calls.as_str()),
                ("partition", self.partition.as_str()),
                ("requests", total.as_str()),
            ],
        );
        Ok(())
    }
}

//! Store counters
//!
//! Counters only, monotonic, reset when the store is opened.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one store.
///
/// Relaxed ordering throughout; readers only ever want a rough snapshot.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    gets: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    batch_requests: AtomicU64,
    unprocessed_retries: AtomicU64,
    query_pages: AtomicU64,
    blobs_written: AtomicU64,
    blobs_deleted: AtomicU64,
    blobs_fetched: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_gets(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_puts(&self, count: u64) {
        self.puts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    /// One batch-write call sent to the primary store
    pub fn increment_batch_requests(&self) {
        self.batch_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Items handed back unprocessed and queued again
    pub fn add_unprocessed_retries(&self, count: u64) {
        self.unprocessed_retries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_query_pages(&self) {
        self.query_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_blobs_written(&self, count: u64) {
        self.blobs_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_blobs_deleted(&self, count: u64) {
        self.blobs_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_blobs_fetched(&self, count: u64) {
        self.blobs_fetched.fetch_add(count, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            batch_requests: self.batch_requests.load(Ordering::Relaxed),
            unprocessed_retries: self.unprocessed_retries.load(Ordering::Relaxed),
            query_pages: self.query_pages.load(Ordering::Relaxed),
            blobs_written: self.blobs_written.load(Ordering::Relaxed),
            blobs_deleted: self.blobs_deleted.load(Ordering::Relaxed),
            blobs_fetched: self.blobs_fetched.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub gets: u64,
    pub puts: u64,
    pub deletes: u64,
    pub batch_requests: u64,
    pub unprocessed_retries: u64,
    pub query_pages: u64,
    pub blobs_written: u64,
    pub blobs_deleted: u64,
    pub blobs_fetched: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let registry = MetricsRegistry::new();
        registry.increment_gets();
        registry.add_puts(3);
        registry.add_deletes(1);
        registry.increment_batch_requests();
        registry.add_unprocessed_retries(5);
        registry.increment_query_pages();
        registry.add_blobs_written(2);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.gets, 1);
        assert_eq!(snapshot.puts, 3);
        assert_eq!(snapshot.deletes, 1);
        assert_eq!(snapshot.batch_requests, 1);
        assert_eq!(snapshot.unprocessed_retries, 5);
        assert_eq!(snapshot.query_pages, 1);
        assert_eq!(snapshot.blobs_written, 2);
        assert_eq!(snapshot.blobs_deleted, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.add_puts(7);
        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["puts"], 7);
        assert_eq!(json["blobs_fetched"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        reg.increment_batch_requests();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.snapshot().batch_requests, 800);
    }
}

//! # In-Memory Primary Store
//!
//! A sorted table held in process memory. Besides backing the CLI and the
//! test suites, it can be scripted to misbehave the way a remote table does:
//! leaving batch items unprocessed, failing calls, or cutting query pages
//! short.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use crate::codec::AttributeValue;

use super::errors::{BackendError, BackendResult};
use super::item::{Item, ItemKey, WriteRequest};
use super::query::{ContinuationToken, QueryPage, QueryRequest, SortKeyCondition};
use super::store::{BackendFuture, BillingMode, PrimaryStore, MAX_BATCH_GET, MAX_BATCH_WRITE};

#[derive(Debug)]
struct Table {
    billing: BillingMode,
    partitions: HashMap<String, BTreeMap<String, AttributeValue>>,
}

impl Table {
    fn new(billing: BillingMode) -> Self {
        Self {
            billing,
            partitions: HashMap::new(),
        }
    }

    fn apply(&mut self, request: WriteRequest) {
        match request {
            WriteRequest::Put(item) => {
                self.partitions
                    .entry(item.hash)
                    .or_default()
                    .insert(item.range, item.data);
            }
            WriteRequest::Delete(key) => {
                if let Some(partition) = self.partitions.get_mut(&key.hash) {
                    partition.remove(&key.range);
                    if partition.is_empty() {
                        self.partitions.remove(&key.hash);
                    }
                }
            }
        }
    }
}

/// Scripted misbehaviour
#[derive(Debug, Default)]
struct FaultPlan {
    /// Unprocessed count for each upcoming batch write, front first
    unprocessed: VecDeque<usize>,
    /// Unprocessed count for every batch write once the script runs out
    sticky_unprocessed: Option<usize>,
    batch_error: Option<BackendError>,
    query_error: Option<BackendError>,
}

/// Primary store held entirely in process memory.
///
/// `None` in the table slot means the table does not exist.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    table: RwLock<Option<Table>>,
    page_size: Option<usize>,
    faults: Mutex<FaultPlan>,
    batch_sizes: Mutex<Vec<usize>>,
    batch_get_sizes: Mutex<Vec<usize>>,
    queries: AtomicUsize,
}

impl MemoryStore {
    /// Create a store whose table does not exist yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: RwLock::new(None),
            page_size: None,
            faults: Mutex::new(FaultPlan::default()),
            batch_sizes: Mutex::new(Vec::new()),
            batch_get_sizes: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Create a store with an empty table
    pub fn with_table(name: impl Into<String>) -> Self {
        let store = Self::new(name);
        if let Ok(mut table) = store.table.write() {
            *table = Some(Table::new(BillingMode::default()));
        }
        store
    }

    /// Cap every query page at `size` items, on top of any request limit
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leave the given number of items unprocessed on each upcoming batch write
    pub fn script_unprocessed(&self, counts: impl IntoIterator<Item = usize>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.unprocessed.extend(counts);
        }
    }

    /// Leave `count` items unprocessed on every batch write after the script
    pub fn always_unprocessed(&self, count: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.sticky_unprocessed = Some(count);
        }
    }

    /// Fail the next batch write with `error`
    pub fn fail_next_batch(&self, error: BackendError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.batch_error = Some(error);
        }
    }

    /// Fail the next query with `error`
    pub fn fail_next_query(&self, error: BackendError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.query_error = Some(error);
        }
    }

    /// Request counts of every batch write received, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    /// Key counts of every batch get received, in order
    pub fn batch_get_sizes(&self) -> Vec<usize> {
        self.batch_get_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    /// Number of query calls received
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// Billing mode of the table, if it exists
    pub fn billing_mode(&self) -> Option<BillingMode> {
        self.table
            .read()
            .ok()
            .and_then(|t| t.as_ref().map(|table| table.billing))
    }

    /// Total number of stored items
    pub fn item_count(&self) -> usize {
        self.table
            .read()
            .ok()
            .and_then(|t| {
                t.as_ref()
                    .map(|table| table.partitions.values().map(BTreeMap::len).sum())
            })
            .unwrap_or(0)
    }

    fn missing_table(&self) -> BackendError {
        BackendError::ResourceNotFound(format!("Table {} does not exist", self.name))
    }

    fn read_table<T>(&self, f: impl FnOnce(&Table) -> BackendResult<T>) -> BackendResult<T> {
        let table = self
            .table
            .read()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        match table.as_ref() {
            Some(t) => f(t),
            None => Err(self.missing_table()),
        }
    }

    fn write_table<T>(&self, f: impl FnOnce(&mut Table) -> BackendResult<T>) -> BackendResult<T> {
        let mut table = self
            .table
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        match table.as_mut() {
            Some(t) => f(t),
            None => Err(self.missing_table()),
        }
    }

    fn next_batch_fault(&self) -> BackendResult<usize> {
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        if let Some(error) = faults.batch_error.take() {
            return Err(error);
        }
        Ok(faults
            .unprocessed
            .pop_front()
            .or(faults.sticky_unprocessed)
            .unwrap_or(0))
    }

    fn take_query_fault(&self) -> BackendResult<()> {
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))?;
        match faults.query_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn run_batch_write(&self, requests: Vec<WriteRequest>) -> BackendResult<Vec<WriteRequest>> {
        if requests.is_empty() || requests.len() > MAX_BATCH_WRITE {
            return Err(BackendError::Validation(format!(
                "Batch write must carry 1 to {} requests, got {}",
                MAX_BATCH_WRITE,
                requests.len()
            )));
        }
        let mut seen = HashSet::new();
        for request in &requests {
            let key = match request {
                WriteRequest::Put(item) => item.key(),
                WriteRequest::Delete(key) => key.clone(),
            };
            if !seen.insert(key) {
                return Err(BackendError::Validation(
                    "Batch write contains duplicate keys".into(),
                ));
            }
        }

        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(requests.len());
        }
        let unprocessed_count = self.next_batch_fault()?.min(requests.len());

        self.write_table(|table| {
            let mut requests = requests;
            let unprocessed = requests.split_off(requests.len() - unprocessed_count);
            for request in requests {
                table.apply(request);
            }
            Ok(unprocessed)
        })
    }

    fn run_query(&self, request: &QueryRequest) -> BackendResult<QueryPage> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.take_query_fault()?;

        if request.limit == Some(0) {
            return Err(BackendError::Validation("Limit must be at least 1".into()));
        }
        if let Some(SortKeyCondition::Between(low, high)) = &request.condition {
            if low > high {
                return Err(BackendError::Validation(format!(
                    "Invalid range: {} is greater than {}",
                    low, high
                )));
            }
        }

        self.read_table(|table| {
            let partition = match table.partitions.get(&request.partition_key) {
                Some(p) => p,
                None => return Ok(QueryPage::default()),
            };

            let start = request.exclusive_start_key.as_ref().map(|t| t.key().range.as_str());
            let in_range = |range: &str| {
                let after_start = match start {
                    Some(s) if request.scan_forward => range > s,
                    Some(s) => range < s,
                    None => true,
                };
                after_start
                    && request
                        .condition
                        .as_ref()
                        .map_or(true, |condition| condition.matches(range))
            };

            let matching: Box<dyn Iterator<Item = (&String, &AttributeValue)> + '_> =
                if request.scan_forward {
                    Box::new(partition.iter())
                } else {
                    Box::new(partition.iter().rev())
                };
            let matching = matching.filter(|(range, _)| in_range(range));

            let cap = match (request.limit, self.page_size) {
                (Some(limit), Some(size)) => Some(limit.min(size)),
                (limit, size) => limit.or(size),
            };

            let items: Vec<Item> = matching
                .take(cap.unwrap_or(usize::MAX))
                .map(|(range, data)| Item {
                    hash: request.partition_key.clone(),
                    range: range.clone(),
                    data: data.clone(),
                })
                .collect();

            let last_evaluated_key = match (cap, items.last()) {
                (Some(cap), Some(last)) if items.len() == cap => {
                    Some(ContinuationToken::new(last.key()))
                }
                _ => None,
            };

            Ok(QueryPage {
                items,
                last_evaluated_key,
            })
        })
    }
}

impl PrimaryStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a ItemKey, _consistent_read: bool) -> BackendFuture<'a, Option<Item>> {
        let result = self.read_table(|table| {
            Ok(table
                .partitions
                .get(&key.hash)
                .and_then(|p| p.get(&key.range))
                .map(|data| Item::new(key.clone(), data.clone())))
        });
        Box::pin(async move { result })
    }

    fn batch_get<'a>(&'a self, keys: &'a [ItemKey]) -> BackendFuture<'a, Vec<Item>> {
        if let Ok(mut sizes) = self.batch_get_sizes.lock() {
            sizes.push(keys.len());
        }
        let result = if keys.len() > MAX_BATCH_GET {
            Err(BackendError::Validation(format!(
                "Batch get accepts at most {} keys, got {}",
                MAX_BATCH_GET,
                keys.len()
            )))
        } else {
            self.read_table(|table| {
                Ok(keys
                    .iter()
                    .filter_map(|key| {
                        table
                            .partitions
                            .get(&key.hash)
                            .and_then(|p| p.get(&key.range))
                            .map(|data| Item::new(key.clone(), data.clone()))
                    })
                    .collect())
            })
        };
        Box::pin(async move { result })
    }

    fn put(&self, item: Item) -> BackendFuture<'_, ()> {
        let result = self.write_table(|table| {
            table.apply(WriteRequest::Put(item));
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn delete<'a>(&'a self, key: &'a ItemKey) -> BackendFuture<'a, ()> {
        let result = self.write_table(|table| {
            table.apply(WriteRequest::Delete(key.clone()));
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn batch_write(&self, requests: Vec<WriteRequest>) -> BackendFuture<'_, Vec<WriteRequest>> {
        let result = self.run_batch_write(requests);
        Box::pin(async move { result })
    }

    fn query<'a>(&'a self, request: &'a QueryRequest) -> BackendFuture<'a, QueryPage> {
        let result = self.run_query(request);
        Box::pin(async move { result })
    }

    fn table_exists(&self) -> BackendFuture<'_, bool> {
        let result = self
            .table
            .read()
            .map(|t| t.is_some())
            .map_err(|_| BackendError::Internal("Lock poisoned".into()));
        Box::pin(async move { result })
    }

    fn create_table(&self, billing: BillingMode) -> BackendFuture<'_, ()> {
        let result = self
            .table
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))
            .and_then(|mut t| match t.as_ref() {
                Some(_) => Err(BackendError::ResourceInUse(format!(
                    "Table {} already exists",
                    self.name
                ))),
                None => {
                    *t = Some(Table::new(billing));
                    Ok(())
                }
            });
        Box::pin(async move { result })
    }

    fn delete_table(&self) -> BackendFuture<'_, ()> {
        let result = self
            .table
            .write()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))
            .and_then(|mut t| match t.take() {
                Some(_) => Ok(()),
                None => Err(self.missing_table()),
            });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(range: &str, n: i64) -> Item {
        Item::new(ItemKey::new("!", range), AttributeValue::Number(n.to_string()))
    }

    fn ranges(page: &QueryPage) -> Vec<&str> {
        page.items.iter().map(|i| i.range.as_str()).collect()
    }

    async fn seeded(ranges: &[&str]) -> MemoryStore {
        let store = MemoryStore::with_table("t");
        for (n, range) in ranges.iter().enumerate() {
            store.put(item(range, n as i64)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::with_table("t");
        store.put(item("a", 1)).await.unwrap();

        let key = ItemKey::new("!", "a");
        assert_eq!(store.get(&key, false).await.unwrap(), Some(item("a", 1)));

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key, true).await.unwrap(), None);
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = MemoryStore::new("t");
        assert!(!store.table_exists().await.unwrap());
        assert!(matches!(
            store.put(item("a", 1)).await,
            Err(BackendError::ResourceNotFound(_))
        ));
        assert!(matches!(
            store.query(&QueryRequest::new("!")).await,
            Err(BackendError::ResourceNotFound(_))
        ));

        store.create_table(BillingMode::provisioned()).await.unwrap();
        assert_eq!(store.billing_mode(), Some(BillingMode::provisioned()));
        assert!(matches!(
            store.create_table(BillingMode::PayPerRequest).await,
            Err(BackendError::ResourceInUse(_))
        ));

        store.delete_table().await.unwrap();
        assert!(!store.table_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_get_skips_absent() {
        let store = seeded(&["a", "b"]).await;
        let keys = vec![ItemKey::new("!", "a"), ItemKey::new("!", "z")];
        let items = store.batch_get(&keys).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].range, "a");
    }

    #[tokio::test]
    async fn test_query_direction_and_condition() {
        let store = seeded(&["a", "b", "c", "d", "e"]).await;

        let mut request = QueryRequest::new("!");
        request.condition = Some(SortKeyCondition::Between("b".into(), "d".into()));
        assert_eq!(ranges(&store.query(&request).await.unwrap()), vec!["b", "c", "d"]);

        request.scan_forward = false;
        assert_eq!(ranges(&store.query(&request).await.unwrap()), vec!["d", "c", "b"]);

        let other = QueryRequest::new("elsewhere");
        assert!(store.query(&other).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_query_pagination() {
        let store = seeded(&["a", "b", "c", "d", "e"]).await;

        let mut request = QueryRequest::new("!");
        request.limit = Some(2);
        let first = store.query(&request).await.unwrap();
        assert_eq!(ranges(&first), vec!["a", "b"]);
        assert!(first.last_evaluated_key.is_some());

        request.exclusive_start_key = first.last_evaluated_key;
        let second = store.query(&request).await.unwrap();
        assert_eq!(ranges(&second), vec!["c", "d"]);

        request.exclusive_start_key = second.last_evaluated_key;
        let third = store.query(&request).await.unwrap();
        assert_eq!(ranges(&third), vec!["e"]);
        assert!(third.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_page_size_caps_unlimited_query() {
        let store = seeded(&["a", "b", "c"]).await.with_page_size(2);
        let page = store.query(&QueryRequest::new("!")).await.unwrap();
        assert_eq!(ranges(&page), vec!["a", "b"]);
        assert!(page.last_evaluated_key.is_some());
    }

    #[tokio::test]
    async fn test_query_rejects_inverted_between() {
        let store = seeded(&["a"]).await;
        let mut request = QueryRequest::new("!");
        request.condition = Some(SortKeyCondition::Between("d".into(), "b".into()));
        assert!(matches!(
            store.query(&request).await,
            Err(BackendError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_write_unprocessed_script() {
        let store = MemoryStore::with_table("t");
        store.script_unprocessed([2]);

        let requests: Vec<WriteRequest> = ["a", "b", "c"]
            .iter()
            .map(|r| WriteRequest::Put(item(r, 0)))
            .collect();
        let unprocessed = store.batch_write(requests).await.unwrap();
        let left: Vec<&str> = unprocessed.iter().map(|r| r.range_key()).collect();
        assert_eq!(left, vec!["b", "c"]);
        assert_eq!(store.item_count(), 1);

        let unprocessed = store.batch_write(unprocessed).await.unwrap();
        assert!(unprocessed.is_empty());
        assert_eq!(store.item_count(), 3);
        assert_eq!(store.batch_sizes(), vec![3, 2]);
    }

    #[tokio::test]
    async fn test_batch_write_validation() {
        let store = MemoryStore::with_table("t");
        let too_many: Vec<WriteRequest> = (0..26)
            .map(|n| WriteRequest::Put(item(&format!("{:02}", n), n)))
            .collect();
        assert!(matches!(
            store.batch_write(too_many).await,
            Err(BackendError::Validation(_))
        ));

        let duplicate = vec![
            WriteRequest::Put(item("a", 1)),
            WriteRequest::Delete(ItemKey::new("!", "a")),
        ];
        assert!(matches!(
            store.batch_write(duplicate).await,
            Err(BackendError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_forced_errors() {
        let store = MemoryStore::with_table("t");
        store.fail_next_batch(BackendError::Unavailable("throttled".into()));
        assert!(matches!(
            store.batch_write(vec![WriteRequest::Put(item("a", 1))]).await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(store
            .batch_write(vec![WriteRequest::Put(item("a", 1))])
            .await
            .unwrap()
            .is_empty());

        store.fail_next_query(BackendError::Internal("boom".into()));
        assert!(store.query(&QueryRequest::new("!")).await.is_err());
        assert!(store.query(&QueryRequest::new("!")).await.is_ok());
        assert_eq!(store.query_count(), 2);
    }
}

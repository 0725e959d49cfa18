//! Range iterator behavior over a paged backend
//!
//! Keys `a`..`j` live in one partition; the backend pages three items at a
//! time so most scans cross page boundaries.

use std::sync::Arc;

use futures_util::StreamExt;

use dynadown::backend::MemoryStore;
use dynadown::blob::MemoryBlobStore;
use dynadown::iterator::RangeIterator;
use dynadown::{DynaDown, IteratorOptions, OpenOptions, Value};

const KEYS: [&str; 10] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];

async fn populated() -> (DynaDown, Arc<MemoryStore>) {
    let primary = Arc::new(MemoryStore::new("ranges").with_page_size(3));
    let store = DynaDown::new("ranges$p", primary.clone(), Arc::new(MemoryBlobStore::new()))
        .unwrap();
    store.open(OpenOptions::default()).await.unwrap();
    for key in KEYS {
        store
            .put(key, Value::String(key.to_uppercase()))
            .await
            .unwrap();
    }
    (store, primary)
}

async fn keys_of(mut cursor: RangeIterator) -> Vec<String> {
    let mut keys = Vec::new();
    while let Some(entry) = cursor.next().await.unwrap() {
        keys.push(entry.key.unwrap());
    }
    keys
}

async fn scan(store: &DynaDown, options: IteratorOptions) -> Vec<String> {
    keys_of(store.iterator(&options).unwrap()).await
}

#[tokio::test]
async fn test_full_scan_crosses_pages() {
    let (store, primary) = populated().await;
    assert_eq!(scan(&store, IteratorOptions::new()).await, KEYS);
    // 3 + 3 + 3 + 1
    assert_eq!(primary.query_count(), 4);
}

#[tokio::test]
async fn test_exclusive_and_inclusive_bounds() {
    let (store, _) = populated().await;
    assert_eq!(
        scan(&store, IteratorOptions::new().gt("c").lt("f")).await,
        vec!["d", "e"]
    );
    assert_eq!(
        scan(&store, IteratorOptions::new().gte("c").lte("f")).await,
        vec!["c", "d", "e", "f"]
    );
    assert_eq!(
        scan(&store, IteratorOptions::new().gt("h")).await,
        vec!["i", "j"]
    );
    assert_eq!(
        scan(&store, IteratorOptions::new().lte("b")).await,
        vec!["a", "b"]
    );
}

#[tokio::test]
async fn test_strict_bound_wins_over_inclusive() {
    let (store, _) = populated().await;
    let options = IteratorOptions::new().gt("c").gte("a").lt("e").lte("j");
    assert_eq!(scan(&store, options).await, vec!["d"]);
}

#[tokio::test]
async fn test_reverse_with_limit() {
    let (store, _) = populated().await;
    let options = IteratorOptions::new().reverse().lt("h").limit(4);
    assert_eq!(scan(&store, options).await, vec!["g", "f", "e", "d"]);
}

#[tokio::test]
async fn test_legacy_start_end() {
    let (store, _) = populated().await;
    assert_eq!(
        scan(&store, IteratorOptions::new().start("b").end("d")).await,
        vec!["b", "c", "d"]
    );
    // In reverse, start is the upper end
    assert_eq!(
        scan(&store, IteratorOptions::new().reverse().start("d").end("b")).await,
        vec!["d", "c", "b"]
    );
}

#[tokio::test]
async fn test_empty_range_issues_no_query() {
    let (store, primary) = populated().await;
    let before = primary.query_count();
    assert!(scan(&store, IteratorOptions::new().gt("e").lt("e"))
        .await
        .is_empty());
    assert!(scan(&store, IteratorOptions::new().limit(0)).await.is_empty());
    assert_eq!(primary.query_count(), before);
}

#[tokio::test]
async fn test_seek_forward() {
    let (store, _) = populated().await;
    let mut cursor = store.iterator(&IteratorOptions::new()).unwrap();
    assert_eq!(cursor.next().await.unwrap().unwrap().key.as_deref(), Some("a"));

    cursor.seek("g");
    let rest = keys_of(cursor).await;
    assert_eq!(rest, vec!["g", "h", "i", "j"]);
}

#[tokio::test]
async fn test_values_only_projection() {
    let (store, _) = populated().await;
    let mut cursor = store
        .iterator(&IteratorOptions::new().values_only().gte("j"))
        .unwrap();
    let entry = cursor.next().await.unwrap().unwrap();
    assert!(entry.key.is_none());
    assert_eq!(entry.value, Some(Value::String("J".into())));
    assert!(cursor.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_stream_collects_in_order() {
    let (store, _) = populated().await;
    let stream = store
        .iterator(&IteratorOptions::new().gte("e").limit(3))
        .unwrap()
        .into_stream();
    let keys: Vec<String> = stream
        .map(|entry| entry.unwrap().key.unwrap())
        .collect()
        .await;
    assert_eq!(keys, vec!["e", "f", "g"]);
}

#[tokio::test]
async fn test_fetch_starts_on_first_next() {
    let (store, _) = populated().await;
    let mut cursor = store.iterator(&IteratorOptions::new().gte("i")).unwrap();
    store.put("z", Value::Null).await.unwrap();

    // Nothing is fetched until the first call, so later writes are visible
    let keys = {
        let mut keys = Vec::new();
        while let Some(entry) = cursor.next().await.unwrap() {
            keys.push(entry.key.unwrap());
        }
        keys
    };
    assert_eq!(keys, vec!["i", "j", "z"]);
}

//! Integration tests for document writes under partial failure and
//! eventually consistent listings

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use blob_store::{connect, BlobStoreConfig, Storage, DEFAULT_API_URL};
use ::common::document::{DocumentStore, StoreError};
use serde_json::{json, Value};
use tempfile::TempDir;
use url::Url;

const BLOG: &str = "content/blog.json";
const VISITORS: &str = "content/visitors.json";

#[tokio::test]
async fn test_no_empty_window_during_write() {
    let (store, _) = common::flaky_store();
    store.write(BLOG, &json!(["first post"])).await.unwrap();

    // Phase one: the new version exists alongside the old one
    let uploaded = store
        .prepare(BLOG, &json!(["first post", "second post"]))
        .unwrap()
        .upload()
        .await
        .unwrap();
    assert_eq!(store.versions(BLOG).await.unwrap().len(), 2);
    let read: Value = store.read(BLOG, json!([])).await.unwrap();
    assert_eq!(read, json!(["first post", "second post"]));

    // Phase two: only the new version remains
    let outcome = uploaded.reap().await;
    assert_eq!(outcome.reaped, 1);
    assert_eq!(outcome.reap_failures, 0);

    let versions = store.versions(BLOG).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].url, outcome.object.url);
    let read: Value = store.read(BLOG, json!([])).await.unwrap();
    assert_eq!(read, json!(["first post", "second post"]));
}

#[tokio::test]
async fn test_failed_cleanup_does_not_fail_write() {
    let (store, backend) = common::flaky_store();
    store.write(BLOG, &json!({"rev": 1})).await.unwrap();

    backend.fail(&backend.faults.delete);
    let outcome = store.write(BLOG, &json!({"rev": 2})).await.unwrap();
    assert_eq!(outcome.reaped, 0);
    assert_eq!(outcome.reap_failures, 1);

    let read: Value = store.read(BLOG, Value::Null).await.unwrap();
    assert_eq!(read["rev"], 2);
    assert_eq!(store.versions(BLOG).await.unwrap().len(), 2);

    // The next successful write sweeps up the leftover
    backend.faults.clear();
    let outcome = store.write(BLOG, &json!({"rev": 3})).await.unwrap();
    assert_eq!(outcome.reaped, 2);
    assert_eq!(store.versions(BLOG).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_cleanup_listing_does_not_fail_write() {
    let (store, backend) = common::flaky_store();
    store.write(BLOG, &json!({"rev": 1})).await.unwrap();

    let uploaded = store
        .prepare(BLOG, &json!({"rev": 2}))
        .unwrap()
        .upload()
        .await
        .unwrap();
    backend.fail(&backend.faults.list);
    let outcome = uploaded.reap().await;
    assert_eq!(outcome.reaped, 0);
    assert_eq!(outcome.reap_failures, 1);

    backend.faults.clear();
    let read: Value = store.read(BLOG, Value::Null).await.unwrap();
    assert_eq!(read["rev"], 2);
}

#[tokio::test]
async fn test_failed_upload_keeps_previous_version() {
    let (store, backend) = common::flaky_store();
    store.write(BLOG, &json!({"rev": 1})).await.unwrap();

    backend.fail(&backend.faults.put);
    let result = store.write(BLOG, &json!({"rev": 2})).await;
    assert!(matches!(result, Err(StoreError::BackendUnavailable(_))));

    // Nothing was deleted after the failed upload
    let [_, _, _, deletes] = backend.calls.snapshot();
    assert_eq!(deletes, 0);

    backend.faults.clear();
    let read: Value = store.read(BLOG, Value::Null).await.unwrap();
    assert_eq!(read["rev"], 1);
}

#[tokio::test]
async fn test_first_write_touches_nothing_else() {
    let (store, backend) = common::flaky_store();

    let outcome = store.write(BLOG, &json!([])).await.unwrap();
    assert_eq!(outcome.reaped, 0);

    let [puts, lists, gets, deletes] = backend.calls.snapshot();
    assert_eq!((puts, lists, gets, deletes), (1, 1, 0, 0));
}

#[tokio::test]
async fn test_read_failures_serve_default() {
    let (store, backend) = common::flaky_store();
    store.write(BLOG, &json!(["post"])).await.unwrap();

    backend.fail(&backend.faults.get);
    let read: Value = store.read(BLOG, json!([])).await.unwrap();
    assert_eq!(read, json!([]));

    backend.faults.clear();
    backend.fail(&backend.faults.list);
    let read: Value = store.read(BLOG, json!([])).await.unwrap();
    assert_eq!(read, json!([]));

    // Strict reads report the outage instead
    let strict: Result<Value, _> = store.read_strict(BLOG, json!([])).await;
    assert!(matches!(strict, Err(StoreError::BackendUnavailable(_))));
}

#[tokio::test]
async fn test_unconfigured_storage_is_surfaced() {
    let config = BlobStoreConfig::Http {
        api_url: Url::parse(DEFAULT_API_URL).unwrap(),
        token: None,
    };
    let store = DocumentStore::new(connect(&config).await.unwrap());

    let read: Result<Value, _> = store.read(BLOG, json!([])).await;
    assert!(matches!(read, Err(StoreError::StorageNotConfigured)));

    let write = store.write(BLOG, &json!([])).await;
    assert!(matches!(write, Err(StoreError::StorageNotConfigured)));
}

#[tokio::test]
async fn test_stale_listing_never_reaps_new_version() {
    let (store, backend) = common::stale_store();
    store.write(BLOG, &json!({"rev": 1})).await.unwrap();

    // The listing still shows only rev 1 while rev 2 is written
    backend.freeze().await;
    let outcome = store.write(BLOG, &json!({"rev": 2})).await.unwrap();
    assert_eq!(outcome.reaped, 1);

    backend.thaw();
    let versions = store.versions(BLOG).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].url, outcome.object.url);
    let read: Value = store.read(BLOG, Value::Null).await.unwrap();
    assert_eq!(read["rev"], 2);
}

#[tokio::test]
async fn test_leftovers_from_stale_listings_converge() {
    let (store, backend) = common::stale_store();

    // Listings lag behind both writes, so neither reaps anything
    backend.freeze().await;
    store.write(BLOG, &json!({"rev": 1})).await.unwrap();
    store.write(BLOG, &json!({"rev": 2})).await.unwrap();

    backend.thaw();
    assert_eq!(store.versions(BLOG).await.unwrap().len(), 2);
    let read: Value = store.read(BLOG, Value::Null).await.unwrap();
    assert_eq!(read["rev"], 2);

    let outcome = store.write(BLOG, &json!({"rev": 3})).await.unwrap();
    assert_eq!(outcome.reaped, 2);
    assert_eq!(store.versions(BLOG).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_append_skipped_when_log_unreadable() {
    let (store, backend) = common::flaky_store();
    store.write(VISITORS, &json!([{"path": "/"}])).await.unwrap();

    backend.fail(&backend.faults.get);
    store.append_best_effort(VISITORS, json!({"path": "/blog"}), 100).await;

    backend.faults.clear();
    let log: Vec<Value> = store.read(VISITORS, Vec::new()).await.unwrap();
    assert_eq!(log, vec![json!({"path": "/"})]);
}

#[tokio::test]
async fn test_append_swallows_write_failure() {
    let (store, backend) = common::flaky_store();

    backend.fail(&backend.faults.put);
    store.append_best_effort(VISITORS, json!({"path": "/"}), 100).await;

    backend.faults.clear();
    let log: Vec<Value> = store.read(VISITORS, Vec::new()).await.unwrap();
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_local_filesystem_documents_persist() {
    let dir = TempDir::new().unwrap();
    let config = BlobStoreConfig::Local {
        path: dir.path().to_path_buf(),
    };

    let store = DocumentStore::new(Arc::new(Storage::new(&config).await.unwrap()));
    store.write(BLOG, &json!(["one"])).await.unwrap();
    store.write(BLOG, &json!(["one", "two"])).await.unwrap();

    let reopened = DocumentStore::new(connect(&config).await.unwrap());
    let read: Vec<String> = reopened.read(BLOG, Vec::new()).await.unwrap();
    assert_eq!(read, vec!["one", "two"]);
    assert_eq!(reopened.versions(BLOG).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unusual_keys_read_after_write() {
    let store = DocumentStore::new(common::memory_backend());

    for key in [
        "content/a~b.json",
        "/content/blog.json",
        "content/my[1].json",
        "content/drafts #2 {wip}.json",
        "content/../escape.json",
    ] {
        store.write(key, &json!(["first"])).await.unwrap();
        store.write(key, &json!(["second"])).await.unwrap();

        let read: Value = store.read(key, json!("missing")).await.unwrap();
        assert_eq!(read, json!(["second"]), "{}", key);
        assert_eq!(store.versions(key).await.unwrap().len(), 1, "{}", key);
    }
}

#[tokio::test]
async fn test_read_follows_version_reaped_mid_read() {
    let (store, backend) = common::interleaved_store();
    store.write(BLOG, &json!({"rev": 1})).await.unwrap();

    // The listing names rev 1, which is gone by the time it is fetched
    backend.arm(r#"{"rev": 2}"#);
    let read: Value = store.read(BLOG, json!("missing")).await.unwrap();
    assert_eq!(read, json!({"rev": 2}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_writers_never_empty_the_key() {
    let store = DocumentStore::new(common::memory_backend());
    store.write(BLOG, &json!({"rev": 0})).await.unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let store = store.clone();
        let done = done.clone();
        tokio::spawn(async move {
            let mut reads = 0usize;
            while !done.load(Ordering::SeqCst) {
                let read: Value = store.read(BLOG, json!("missing")).await.unwrap();
                assert_ne!(read, json!("missing"));
                reads += 1;
                tokio::task::yield_now().await;
            }
            reads
        })
    };

    for rev in 1..=25 {
        let writer = |name: &'static str| {
            let store = store.clone();
            tokio::spawn(async move { store.write(BLOG, &json!({"rev": rev, "writer": name})).await })
        };
        let (a, b) = tokio::join!(writer("a"), writer("b"));
        let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());
        assert!(!(a.superseded && b.superseded));

        let versions = store.versions(BLOG).await.unwrap();
        assert_eq!(versions.len(), 1);
        let read: Value = store.read(BLOG, Value::Null).await.unwrap();
        assert_eq!(read["rev"], rev);
    }

    done.store(true, Ordering::SeqCst);
    assert!(reader.await.unwrap() > 0);
}

#[tokio::test]
async fn test_superseded_write_reaps_itself() {
    let store = DocumentStore::new(common::memory_backend());
    store.write(BLOG, &json!({"rev": 0})).await.unwrap();

    let slow = store
        .prepare(BLOG, &json!({"rev": 1}))
        .unwrap()
        .upload()
        .await
        .unwrap();
    let fast = store.write(BLOG, &json!({"rev": 2})).await.unwrap();
    assert!(!fast.superseded);

    let outcome = slow.reap().await;
    assert!(outcome.superseded);
    assert_eq!(outcome.reap_failures, 0);

    let versions = store.versions(BLOG).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].url, fast.object.url);
    let read: Value = store.read(BLOG, Value::Null).await.unwrap();
    assert_eq!(read, json!({"rev": 2}));
}

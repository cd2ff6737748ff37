//! Shared test doubles for document store integration tests
#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use blob_store::{BlobBackend, BlobError, BlobObject, Result, Storage};
use bytes::Bytes;
use ::common::document::DocumentStore;
use parking_lot::Mutex;

fn injected(op: &str) -> BlobError {
    BlobError::Io(io::Error::new(
        io::ErrorKind::ConnectionReset,
        format!("injected {} failure", op),
    ))
}

/// Per-operation failure switches.
#[derive(Debug, Default)]
pub struct Faults {
    pub put: AtomicBool,
    pub list: AtomicBool,
    pub get: AtomicBool,
    pub delete: AtomicBool,
}

impl Faults {
    pub fn clear(&self) {
        for flag in [&self.put, &self.list, &self.get, &self.delete] {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

/// Per-operation call counters.
#[derive(Debug, Default)]
pub struct Calls {
    pub put: AtomicUsize,
    pub list: AtomicUsize,
    pub get: AtomicUsize,
    pub delete: AtomicUsize,
}

impl Calls {
    pub fn snapshot(&self) -> [usize; 4] {
        [
            self.put.load(Ordering::SeqCst),
            self.list.load(Ordering::SeqCst),
            self.get.load(Ordering::SeqCst),
            self.delete.load(Ordering::SeqCst),
        ]
    }
}

/// Wraps a backend, counting calls and failing them on demand.
#[derive(Debug, Clone)]
pub struct FlakyBackend {
    inner: Arc<dyn BlobBackend>,
    pub faults: Arc<Faults>,
    pub calls: Arc<Calls>,
}

impl FlakyBackend {
    pub fn new(inner: Arc<dyn BlobBackend>) -> Self {
        Self {
            inner,
            faults: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn fail(&self, flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobBackend for FlakyBackend {
    async fn put(&self, prefix: &str, data: Bytes, content_type: &str) -> Result<BlobObject> {
        self.calls.put.fetch_add(1, Ordering::SeqCst);
        if self.faults.put.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }
        self.inner.put(prefix, data, content_type).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        if self.faults.list.load(Ordering::SeqCst) {
            return Err(injected("list"));
        }
        self.inner.list(prefix).await
    }

    async fn get(&self, url: &str) -> Result<Bytes> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        if self.faults.get.load(Ordering::SeqCst) {
            return Err(injected("get"));
        }
        self.inner.get(url).await
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        if self.faults.delete.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete(url).await
    }
}

/// Wraps a backend whose listings can lag behind writes, the way a
/// cached list endpoint does.
///
/// While frozen, `list` answers from a snapshot taken at `freeze` time:
/// newer objects are missing and deleted ones still show up.
#[derive(Debug, Clone)]
pub struct StaleListBackend {
    inner: Arc<dyn BlobBackend>,
    snapshot: Arc<Mutex<Option<Vec<BlobObject>>>>,
}

impl StaleListBackend {
    pub fn new(inner: Arc<dyn BlobBackend>) -> Self {
        Self {
            inner,
            snapshot: Arc::default(),
        }
    }

    pub async fn freeze(&self) {
        let objects = self.inner.list("").await.unwrap();
        *self.snapshot.lock() = Some(objects);
    }

    pub fn thaw(&self) {
        *self.snapshot.lock() = None;
    }
}

#[async_trait]
impl BlobBackend for StaleListBackend {
    async fn put(&self, prefix: &str, data: Bytes, content_type: &str) -> Result<BlobObject> {
        self.inner.put(prefix, data, content_type).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let frozen = self.snapshot.lock().clone();
        match frozen {
            Some(objects) => Ok(objects
                .into_iter()
                .filter(|o| o.pathname.starts_with(prefix))
                .collect()),
            None => self.inner.list(prefix).await,
        }
    }

    async fn get(&self, url: &str) -> Result<Bytes> {
        self.inner.get(url).await
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.inner.delete(url).await
    }
}

/// Wraps a backend so that a concurrent write lands between a reader's
/// `list` and its `get`: once armed, the next `list` returns its result,
/// but only after a new version was uploaded and every listed one deleted.
#[derive(Debug, Clone)]
pub struct InterleavedWriteBackend {
    inner: Arc<dyn BlobBackend>,
    pending: Arc<Mutex<Option<Bytes>>>,
}

impl InterleavedWriteBackend {
    pub fn new(inner: Arc<dyn BlobBackend>) -> Self {
        Self {
            inner,
            pending: Arc::default(),
        }
    }

    /// Upload `body` and reap the listed versions during the next `list`.
    pub fn arm(&self, body: impl Into<Bytes>) {
        *self.pending.lock() = Some(body.into());
    }
}

#[async_trait]
impl BlobBackend for InterleavedWriteBackend {
    async fn put(&self, prefix: &str, data: Bytes, content_type: &str) -> Result<BlobObject> {
        self.inner.put(prefix, data, content_type).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let listed = self.inner.list(prefix).await?;
        let pending = self.pending.lock().take();
        if let Some(body) = pending {
            self.inner.put(prefix, body, "application/json").await?;
            for object in &listed {
                self.inner.delete(&object.url).await?;
            }
        }
        Ok(listed)
    }

    async fn get(&self, url: &str) -> Result<Bytes> {
        self.inner.get(url).await
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.inner.delete(url).await
    }
}

pub fn memory_backend() -> Arc<dyn BlobBackend> {
    Arc::new(Storage::memory())
}

/// A document store over an in-memory backend with fault injection.
pub fn flaky_store() -> (DocumentStore, FlakyBackend) {
    let backend = FlakyBackend::new(memory_backend());
    (DocumentStore::new(Arc::new(backend.clone())), backend)
}

/// A document store over an in-memory backend with lagging listings.
pub fn stale_store() -> (DocumentStore, StaleListBackend) {
    let backend = StaleListBackend::new(memory_backend());
    (DocumentStore::new(Arc::new(backend.clone())), backend)
}

/// A document store whose next listing can be overtaken by another write.
pub fn interleaved_store() -> (DocumentStore, InterleavedWriteBackend) {
    let backend = InterleavedWriteBackend::new(memory_backend());
    (DocumentStore::new(Arc::new(backend.clone())), backend)
}

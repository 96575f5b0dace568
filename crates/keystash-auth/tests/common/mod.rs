//! Common test infrastructure for keystash-auth tests

#![allow(dead_code)]

use async_trait::async_trait;
use keystash_core::KeyEncoding;
use keystash_store::{
    KeyedObjectStore, MemoryBackend, ObjectBackend, StoreError, StoreResult,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const TEST_PREFIX: &str = "bots/alice/";

/// Shared in-memory bucket and a store over it
pub fn memory_store() -> (Arc<MemoryBackend>, Arc<KeyedObjectStore>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = reopen(&backend);
    (backend, store)
}

/// A fresh store over an existing bucket, as after a process restart
pub fn reopen(backend: &Arc<MemoryBackend>) -> Arc<KeyedObjectStore> {
    Arc::new(KeyedObjectStore::new(
        backend.clone(),
        TEST_PREFIX,
        KeyEncoding::Substitute,
    ))
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Backend that rejects writes to object keys containing `needle`
pub struct RejectingBackend {
    inner: MemoryBackend,
    needle: String,
}

impl RejectingBackend {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            inner: MemoryBackend::new(),
            needle: needle.into(),
        }
    }

    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }
}

#[async_trait]
impl ObjectBackend for RejectingBackend {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()> {
        if key.contains(&self.needle) {
            return Err(StoreError::backend(key, "access denied"));
        }
        self.inner.put_object(key, body, content_type).await
    }

    async fn get_object(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.inner.delete_object(key).await
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

/// Backend whose calls on object keys containing `needle` park until
/// released. Records the key of every call as it starts.
pub struct GatedBackend {
    inner: MemoryBackend,
    needle: String,
    gate: Semaphore,
    started: Mutex<Vec<String>>,
}

impl GatedBackend {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            inner: MemoryBackend::new(),
            needle: needle.into(),
            gate: Semaphore::new(0),
            started: Mutex::new(Vec::new()),
        }
    }

    /// Let one parked call through
    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }

    /// Keys of all calls started so far, sorted
    pub fn started(&self) -> Vec<String> {
        let mut keys = self.started.lock().unwrap().clone();
        keys.sort();
        keys
    }

    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }

    async fn enter(&self, key: &str) {
        self.started.lock().unwrap().push(key.to_string());
        if key.contains(&self.needle) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl ObjectBackend for GatedBackend {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()> {
        self.enter(key).await;
        self.inner.put_object(key, body, content_type).await
    }

    async fn get_object(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.enter(key).await;
        self.inner.get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.enter(key).await;
        self.inner.delete_object(key).await
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Poll `check` until it holds, failing the test after two seconds
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let waited = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        while !check().await {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached within two seconds");
}

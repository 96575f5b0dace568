//! Common test infrastructure for keystash-store tests
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use keystash_core::KeyEncoding;
use keystash_store::{KeyedObjectStore, MemoryBackend, ObjectBackend, StoreResult};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Prefix used by tests that do not care about the prefix
pub const TEST_PREFIX: &str = "test-session/";

/// Store over a fresh in-memory backend
pub fn memory_store() -> (Arc<MemoryBackend>, KeyedObjectStore) {
    let backend = Arc::new(MemoryBackend::new());
    let store = KeyedObjectStore::new(backend.clone(), TEST_PREFIX, KeyEncoding::Substitute);
    (backend, store)
}

/// Backend whose writes to one object key park until released
///
/// Lets tests hold a storage call open and observe what else can run.
pub struct GatedBackend {
    inner: MemoryBackend,
    gated_key: String,
    gate: Semaphore,
}

impl GatedBackend {
    pub fn new(gated_key: impl Into<String>) -> Self {
        Self {
            inner: MemoryBackend::new(),
            gated_key: gated_key.into(),
            gate: Semaphore::new(0),
        }
    }

    /// Let one parked write through
    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }

    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }
}

#[async_trait]
impl ObjectBackend for GatedBackend {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()> {
        if key == self.gated_key {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
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
        "gated"
    }
}

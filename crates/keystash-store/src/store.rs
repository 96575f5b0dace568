//! Keyed JSON object store
//!
//! Reads, writes and deletes JSON values by logical key. Every operation on
//! a resolved object key holds that key's named lock for the duration of the
//! storage call, so operations on one key run one at a time in arrival
//! order while different keys proceed in parallel.

use crate::backend::{ObjectBackend, JSON_CONTENT_TYPE};
use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::keys::ObjectKeyResolver;
use crate::locks::NamedLocks;
use crate::s3::S3Backend;
use keystash_core::{KeyEncoding, StoreConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// JSON value store over an object backend
pub struct KeyedObjectStore {
    backend: Arc<dyn ObjectBackend>,
    resolver: ObjectKeyResolver,
    locks: NamedLocks,
}

impl KeyedObjectStore {
    /// Create a store over `backend` with the given key prefix and encoding
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        prefix: impl Into<String>,
        encoding: KeyEncoding,
    ) -> Self {
        Self {
            backend,
            resolver: ObjectKeyResolver::new(prefix, encoding),
            locks: NamedLocks::new(),
        }
    }

    /// Create a store over `backend` using the prefix and encoding in `config`
    pub fn with_config(backend: Arc<dyn ObjectBackend>, config: &StoreConfig) -> Self {
        Self::new(backend, config.prefix.clone(), config.key_encoding)
    }

    /// Connect to the S3 bucket described by `config`
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let backend = S3Backend::new(config).await?;
        Ok(Self::with_config(Arc::new(backend), config))
    }

    /// Object key a logical key is stored under
    pub fn object_key(&self, key: &str) -> String {
        self.resolver.resolve(key)
    }

    pub fn resolver(&self) -> &ObjectKeyResolver {
        &self.resolver
    }

    pub fn locks(&self) -> &NamedLocks {
        &self.locks
    }

    pub fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    /// Serialize `value` and replace the object at `key`
    ///
    /// Storage failures are returned to the caller.
    pub async fn write<T>(&self, value: &T, key: &str) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let object_key = self.object_key(key);
        let body = codec::encode(value).map_err(|source| StoreError::Encode {
            key: object_key.clone(),
            source,
        })?;

        let _guard = self.locks.acquire(&object_key).await;
        debug!(
            "Writing {} bytes to {} ({})",
            body.len(),
            object_key,
            self.backend.name()
        );
        self.backend
            .put_object(&object_key, body, JSON_CONTENT_TYPE)
            .await
    }

    /// Read the value at `key`, distinguishing a missing object (`Ok(None)`)
    /// from a failed request (`Err`)
    pub async fn try_read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let object_key = self.object_key(key);

        let body = {
            let _guard = self.locks.acquire(&object_key).await;
            self.backend.get_object(&object_key).await?
        };

        match body {
            Some(bytes) => codec::decode(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: object_key,
                    source,
                }),
            None => {
                debug!("No object at {}", object_key);
                Ok(None)
            }
        }
    }

    /// Read the value at `key`
    ///
    /// A missing object and a failed request both come back as `Ok(None)`;
    /// failures are logged. An object that exists but does not parse is
    /// reported as [`StoreError::Corrupt`].
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.try_read(key).await {
            Err(StoreError::Backend { key, message }) => {
                warn!("Treating unreadable object {} as absent: {}", key, message);
                Ok(None)
            }
            other => other,
        }
    }

    /// Delete the object at `key`, returning storage failures
    pub async fn try_remove(&self, key: &str) -> StoreResult<()> {
        let object_key = self.object_key(key);
        let _guard = self.locks.acquire(&object_key).await;
        debug!("Removing {}", object_key);
        self.backend.delete_object(&object_key).await
    }

    /// Delete the object at `key`; failures are logged and otherwise ignored
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.try_remove(key).await {
            warn!("Ignoring failed delete: {}", e);
        }
    }
}

impl std::fmt::Debug for KeyedObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedObjectStore")
            .field("backend", &self.backend.name())
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

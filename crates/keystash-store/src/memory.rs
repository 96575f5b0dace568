//! In-memory object backend

use crate::backend::ObjectBackend;
use crate::error::StoreResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// HashMap-backed object backend
///
/// Intended for tests and embedding. Behaves like a strongly consistent
/// bucket: reads observe the latest completed write.
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Sorted list of stored object keys
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Raw body of an object, bypassing the codec
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|o| o.body.clone())
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }

    /// Store a raw body directly, e.g. to plant a corrupt object in tests
    pub async fn insert_raw(&self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(
            key.into(),
            StoredObject {
                body: body.into(),
                content_type: crate::backend::JSON_CONTENT_TYPE.to_string(),
            },
        );
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.objects.read().await.get(key).map(|o| o.body.clone()))
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty().await);

        backend
            .put_object("a.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        assert_eq!(backend.get_object("a.json").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(
            backend.content_type("a.json").await.as_deref(),
            Some("application/json")
        );

        backend.delete_object("a.json").await.unwrap();
        assert_eq!(backend.get_object("a.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.delete_object("never.json").await.is_ok());
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let backend = MemoryBackend::new();
        backend.insert_raw("b", "1").await;
        backend.insert_raw("a", "2").await;
        assert_eq!(backend.keys().await, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(backend.len().await, 2);
        assert!(backend.contains("a").await);
    }
}

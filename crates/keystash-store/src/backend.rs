//! Object storage backend trait

use crate::error::StoreResult;
use async_trait::async_trait;

/// Content type of every object the store writes
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Whole-object storage operations
///
/// Keys passed here are already resolved object keys. Implementations do
/// no locking of their own; the keyed store serializes access per key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Replace the object at `key`
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()>;

    /// Fetch the object at `key`
    ///
    /// Returns Ok(None) if the object does not exist.
    /// Returns Err if the request failed for any other reason.
    async fn get_object(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Delete the object at `key`. Deleting a missing object succeeds.
    async fn delete_object(&self, key: &str) -> StoreResult<()>;

    /// Backend name for log messages
    fn name(&self) -> &'static str;
}

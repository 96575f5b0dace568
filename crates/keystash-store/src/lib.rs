//! Keyed JSON object storage for keystash
//!
//! This crate maps logical keys (`creds.json`, `pre-key-7.json`) onto
//! objects in a bucket:
//! - **Codec**: JSON with byte sequences tagged as `{"type":"Buffer","data":[...]}`
//! - **Keys**: prefix plus substitution or percent encoding of the logical key
//! - **Locking**: one FIFO lock per object key, dropped when idle
//! - **Backends**: S3 (and compatibles) or an in-memory map
//!
//! ## Usage
//!
//! ```ignore
//! use keystash_core::StoreConfig;
//! use keystash_store::{codec::Value, KeyedObjectStore};
//!
//! let config = StoreConfig::new("sessions").with_prefix("alice/");
//! let store = KeyedObjectStore::connect(&config).await?;
//!
//! store.write(&Value::from(vec![0u8, 1, 255]), "sender-key-abc.json").await?;
//! let value: Option<Value> = store.read("sender-key-abc.json").await?;
//! ```

pub mod backend;
pub mod codec;
pub mod error;
pub mod keys;
pub mod locks;
pub mod memory;
pub mod s3;
pub mod store;

// Re-export primary types at crate root
pub use backend::{ObjectBackend, JSON_CONTENT_TYPE};
pub use codec::{Buffer, Value};
pub use error::{StoreError, StoreResult};
pub use keys::{percent_encode, sanitize, ObjectKeyResolver};
pub use locks::{NamedLockGuard, NamedLocks};
pub use memory::MemoryBackend;
pub use s3::S3Backend;
pub use store::KeyedObjectStore;

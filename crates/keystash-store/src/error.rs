//! Error types for keystash-store

use thiserror::Error;

/// Result alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from keyed object store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The storage service rejected or failed the request
    #[error("storage backend error for {key}: {message}")]
    Backend { key: String, message: String },

    /// A stored object is not valid JSON for the requested type
    #[error("corrupt object {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid store configuration
    #[error(transparent)]
    Config(#[from] keystash_core::Error),
}

impl StoreError {
    /// Create a backend error for an object key
    pub fn backend(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Backend {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Whether the failure came from the storage service
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

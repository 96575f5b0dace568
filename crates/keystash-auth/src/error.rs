//! Error types for keystash-auth

use keystash_store::StoreError;
use thiserror::Error;

/// Result alias for auth state operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Errors from auth state operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// The underlying keyed store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Key material has the wrong shape
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Unrecognized signal data category
    #[error("Unknown signal data type: {0}")]
    UnknownDataType(String),

    /// A stored record does not decode as its category's type
    #[error("Invalid {category} record {id}: {source}")]
    InvalidRecord {
        category: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AuthError {
    /// Create an invalid key error
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }
}

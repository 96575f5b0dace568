//! # keystash-core
//!
//! Core library for keystash providing:
//! - Storage configuration types (bucket, prefix, region, endpoint, credentials)
//! - Configuration file loading (keystash.yaml) with environment overrides
//! - Shared error types

pub mod config;
pub mod error;
pub mod types;

pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use types::{CredentialsSource, KeyEncoding, RetryConfig, StoreConfig};

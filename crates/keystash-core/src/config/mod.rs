//! Configuration loading and management

mod loader;

pub use loader::{ConfigLoader, ENV_BUCKET, ENV_ENDPOINT, ENV_PREFIX, ENV_REGION};

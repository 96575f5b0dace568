//! CLI command implementations

pub mod creds;
pub mod init;
pub mod keys;
pub mod object_key;

use anyhow::{Context, Result};
use camino::Utf8Path;
use keystash_core::{ConfigLoader, Error as ConfigError, StoreConfig};
use keystash_store::KeyedObjectStore;
use std::sync::Arc;
use tracing::debug;

use crate::cli::StoreArgs;

/// Build the store configuration from the config file, environment and flags
///
/// An explicit `--config` path must exist. Without one, `keystash.yaml` is
/// searched for from the working directory upward; when none is found the
/// configuration comes from `KEYSTASH_*` variables and flags alone. The
/// result is not validated, so a file may leave out what a flag supplies.
pub fn resolve_config(path: Option<&Utf8Path>, overrides: &StoreArgs) -> Result<StoreConfig> {
    let mut config = match path {
        Some(path) => ConfigLoader::read(Some(path))
            .with_context(|| format!("Failed to load config from {}", path))?
            .into_config(),
        None => match ConfigLoader::read(None) {
            Ok(loader) => {
                debug!("Using config file {}", loader.config_path);
                loader.into_config()
            }
            Err(ConfigError::ConfigNotFound { .. }) => {
                debug!("No config file found, using environment and flags");
                let mut config = StoreConfig::new("");
                config.apply_env_overrides();
                config
            }
            Err(e) => return Err(e).context("Failed to load keystash.yaml"),
        },
    };

    overrides.apply(&mut config);
    Ok(config)
}

/// Resolve the configuration and connect to its bucket
pub async fn connect(path: Option<&Utf8Path>, overrides: &StoreArgs) -> Result<Arc<KeyedObjectStore>> {
    let config = resolve_config(path, overrides)?;
    config
        .validate()
        .context("Invalid store configuration (pass --bucket, set KEYSTASH_BUCKET or add bucket to keystash.yaml)")?;

    let store = KeyedObjectStore::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to bucket {}", config.bucket))?;
    Ok(Arc::new(store))
}

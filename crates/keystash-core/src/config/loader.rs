//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::types::StoreConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["keystash.yaml", "keystash.yml"];

/// Environment variables that override file values
pub const ENV_BUCKET: &str = "KEYSTASH_BUCKET";
pub const ENV_PREFIX: &str = "KEYSTASH_PREFIX";
pub const ENV_REGION: &str = "KEYSTASH_REGION";
pub const ENV_ENDPOINT: &str = "KEYSTASH_ENDPOINT";

/// Loaded store configuration and where it came from
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// The parsed configuration
    pub config: StoreConfig,

    /// Path to the configuration file
    pub config_path: Utf8PathBuf,
}

impl ConfigLoader {
    /// Load configuration from the specified path or search for it
    ///
    /// Environment overrides are applied after parsing and the result is
    /// validated before it is returned.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let loader = Self::read(path)?;
        loader.config.validate()?;
        Ok(loader)
    }

    /// Like [`Self::load`], without validation
    ///
    /// For callers that apply further overrides (command-line flags) and
    /// validate the merged result themselves.
    pub fn read(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = if let Some(p) = path {
            let content = fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.as_str())
                } else {
                    Error::Io(e)
                }
            })?;
            (p.to_owned(), content)
        } else {
            let cwd = std::env::current_dir().map_err(Error::Io)?;
            let cwd = Utf8PathBuf::try_from(cwd)
                .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;
            Self::find_config(&cwd)?
        };

        debug!("Loading store configuration from {}", config_path);

        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides();

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Parse a YAML document into a store configuration
    pub fn from_yaml_str(content: &str) -> Result<StoreConfig> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Find a configuration file in `start` or any of its parents
    pub fn find_config(start: &Utf8Path) -> Result<(Utf8PathBuf, String)> {
        let mut current = start;

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "keystash.yaml (searched current and parent directories)",
        ))
    }

    /// Get the inner configuration
    pub fn inner(&self) -> &StoreConfig {
        &self.config
    }

    /// Consume the loader and return the configuration
    pub fn into_config(self) -> StoreConfig {
        self.config
    }
}

impl StoreConfig {
    /// Override bucket, prefix, region and endpoint from `KEYSTASH_*` variables
    pub fn apply_env_overrides(&mut self) {
        if let Some(bucket) = env_value(ENV_BUCKET) {
            self.bucket = bucket;
        }
        if let Some(prefix) = env_value(ENV_PREFIX) {
            self.prefix = prefix;
        }
        if let Some(region) = env_value(ENV_REGION) {
            self.region = region;
        }
        if let Some(endpoint) = env_value(ENV_ENDPOINT) {
            self.endpoint = Some(endpoint);
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

//! Object store configuration types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default AWS region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default number of attempts the storage client makes per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Configuration for the bucket-backed auth state store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bucket holding the session objects. May be left out of the file and
    /// supplied by `KEYSTASH_BUCKET` or a flag; `validate` requires it.
    #[serde(default)]
    pub bucket: String,

    /// Prefix prepended to every object key (e.g. "sessions/alice/")
    #[serde(default)]
    pub prefix: String,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3-compatible endpoint (MinIO, R2, Wasabi)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Use path-style addressing. Always on when `endpoint` is set.
    #[serde(default)]
    pub force_path_style: bool,

    /// Where the storage client gets its credentials
    #[serde(default)]
    pub credentials: CredentialsSource,

    /// Storage client retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// How logical keys are turned into object keys
    #[serde(default)]
    pub key_encoding: KeyEncoding,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl StoreConfig {
    /// Create a configuration for a bucket with every other field defaulted
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
            region: default_region(),
            endpoint: None,
            force_path_style: false,
            credentials: CredentialsSource::default(),
            retry: RetryConfig::default(),
            key_encoding: KeyEncoding::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialsSource) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.key_encoding = encoding;
        self
    }

    /// Whether the client should use path-style bucket addressing
    pub fn path_style(&self) -> bool {
        self.force_path_style || self.endpoint.is_some()
    }

    /// Check the configuration for values the storage client cannot use
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::missing_field("bucket"));
        }

        if self.region.trim().is_empty() {
            return Err(Error::missing_field("region"));
        }

        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(Error::invalid_config(format!(
                    "endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_config("retry.max_attempts must be at least 1"));
        }

        match &self.credentials {
            CredentialsSource::Static {
                access_key_id,
                secret_access_key,
                ..
            } => {
                if access_key_id.is_empty() || secret_access_key.is_empty() {
                    return Err(Error::invalid_config(
                        "static credentials need both access_key_id and secret_access_key",
                    ));
                }
            }
            CredentialsSource::Profile { name } if name.is_empty() => {
                return Err(Error::missing_field("credentials.name"));
            }
            _ => {}
        }

        Ok(())
    }
}

/// Credentials provider for the storage client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CredentialsSource {
    /// Default provider chain (environment, profile, instance metadata)
    #[default]
    Environment,
    /// Named profile from the shared config files
    Profile { name: String },
    /// Fixed access keys
    Static {
        access_key_id: String,
        secret_access_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_token: Option<String>,
    },
}

impl std::fmt::Debug for CredentialsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "Environment"),
            Self::Profile { name } => f.debug_struct("Profile").field("name", name).finish(),
            Self::Static { access_key_id, .. } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Storage client retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

/// Logical key to object key encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// `/` becomes `__` and `:` becomes `-`. Shares object names with the
    /// file-based store, but distinct keys can collide.
    #[default]
    Substitute,
    /// Percent-encode `%`, `/` and `:`. Collision-free.
    Percent,
}

impl std::fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyEncoding::Substitute => write!(f, "substitute"),
            KeyEncoding::Percent => write!(f, "percent"),
        }
    }
}

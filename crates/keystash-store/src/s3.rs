//! S3 object backend
//!
//! Supports AWS S3 and S3-compatible storage (MinIO, Wasabi, Cloudflare R2).

use crate::backend::ObjectBackend;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use keystash_core::{CredentialsSource, StoreConfig};
use tracing::debug;

/// Provider name reported for static credentials
const STATIC_PROVIDER_NAME: &str = "keystash-static";

/// S3 bucket backend
pub struct S3Backend {
    /// S3 client
    client: Client,
    /// Bucket name
    bucket: String,
}

impl S3Backend {
    /// Create a new S3 backend from configuration
    pub async fn new(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let client = Self::create_client(config).await;

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build an S3 client for the configured region, endpoint, credentials
    /// and retry policy
    async fn create_client(config: &StoreConfig) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.retry.max_attempts));

        match &config.credentials {
            CredentialsSource::Environment => {}
            CredentialsSource::Profile { name } => {
                debug!("Using credentials profile: {}", name);
                loader = loader.profile_name(name);
            }
            CredentialsSource::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                debug!("Using static credentials for key id {}", access_key_id);
                loader = loader.credentials_provider(Credentials::new(
                    access_key_id.clone(),
                    secret_access_key.clone(),
                    session_token.clone(),
                    None,
                    STATIC_PROVIDER_NAME,
                ));
            }
        }

        let sdk_config = loader.load().await;
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        // Configure custom endpoint for S3-compatible storage
        if let Some(endpoint_url) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint_url);
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }
        if config.path_style() {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        Client::from_conf(s3_config_builder.build())
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()> {
        debug!(
            "Uploading object ({} bytes): s3://{}/{}",
            body.len(),
            self.bucket,
            key
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::backend(key, DisplayErrorContext(&e)))?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        debug!("Downloading object: s3://{}/{}", self.bucket, key);

        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    debug!("Object does not exist: s3://{}/{}", self.bucket, key);
                    return Ok(None);
                }
                return Err(StoreError::backend(key, DisplayErrorContext(&service_error)));
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::backend(key, format!("failed to read body: {}", e)))?;

        let data = body.into_bytes().to_vec();
        debug!(
            "Downloaded {} bytes from s3://{}/{}",
            data.len(),
            self.bucket,
            key
        );

        Ok(Some(data))
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        debug!("Deleting object: s3://{}/{}", self.bucket, key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::backend(key, DisplayErrorContext(&e)))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

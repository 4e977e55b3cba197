//! Object Storage Client
//!
//! S3-compatible storage for media variants.
//! Supports any S3-compatible backend: AWS S3, MinIO, Backblaze B2, Cloudflare R2.

use aws_config::Region;
use aws_sdk_s3::{
    config::{Credentials, IdentityCache, SharedCredentialsProvider, StalledStreamProtectionConfig},
    primitives::ByteStream,
    Client,
};
use thiserror::Error;
use tracing::info;

use crate::config::Config;

/// Object storage client wrapper.
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
}

/// Storage-related errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to upload an object.
    #[error("Failed to upload object: {0}")]
    Upload(String),

    /// Failed to download an object.
    #[error("Failed to download object: {0}")]
    Download(String),

    /// Failed to delete an object.
    #[error("Failed to delete object: {0}")]
    Delete(String),

    /// Storage configuration error.
    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl ObjectStorage {
    /// Create a new storage client from configuration.
    ///
    /// Supports custom endpoints for S3-compatible backends (MinIO, R2, B2).
    /// Uses path-style addressing when a custom endpoint is configured.
    pub async fn new(config: &Config) -> Result<Self, StorageError> {
        let region = Region::new(
            std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .region(region)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
            .identity_cache(IdentityCache::no_cache());

        // Configure credentials from environment
        if let (Ok(access_key), Ok(secret_key)) = (
            std::env::var("AWS_ACCESS_KEY_ID"),
            std::env::var("AWS_SECRET_ACCESS_KEY"),
        ) {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "environment",
            );
            s3_config_builder =
                s3_config_builder.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        // Configure custom endpoint for S3-compatible backends
        if let Some(endpoint) = &config.s3_endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true); // Required for MinIO and most S3-compatible backends
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        info!(
            bucket = %config.s3_bucket,
            endpoint = ?config.s3_endpoint,
            "Object storage client initialized"
        );

        Ok(Self {
            client,
            bucket: config.s3_bucket.clone(),
        })
    }

    /// Upload an object.
    ///
    /// # Arguments
    /// * `key` - The object key (path)
    /// * `data` - Contents as bytes
    /// * `content_type` - MIME type of the object
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(())
    }

    /// Stream an object's bytes.
    pub async fn get_object_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Download(e.to_string()))?;

        Ok(object.body)
    }

    /// Delete an object.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        Ok(())
    }

    /// Check if the bucket is accessible (health check).
    pub async fn health_check(&self) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Config(format!("Bucket not accessible: {e}")))?;

        Ok(())
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

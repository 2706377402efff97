//! S3-backed content store.

use super::{ContentStore, StorageError};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Instant;

/// Content store issuing whole-object requests against one S3 bucket.
#[derive(Clone)]
pub struct S3ContentStore {
    client: Client,
    bucket: String,
}

impl S3ContentStore {
    /// Build a store from shared AWS configuration.
    ///
    /// Path-style addressing is enabled when `endpoint_override` is true so that S3-compatible
    /// local stacks resolve the bucket correctly.
    pub fn new(sdk_config: &aws_config::SdkConfig, bucket: String, endpoint_override: bool) -> Self {
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(endpoint_override)
            .build();
        tracing::debug!(bucket = %bucket, path_style = endpoint_override, "Initialized S3 client");
        Self {
            client: Client::from_conf(config),
            bucket,
        }
    }

    fn backend_error(&self, key: &str, message: String, started: Instant, action: &str) -> StorageError {
        tracing::error!(
            bucket = %self.bucket,
            key,
            error = %message,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "S3 {action} failed"
        );
        StorageError::Backend {
            key: key.to_string(),
            message,
        }
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let started = Instant::now();
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| {
                self.backend_error(key, DisplayErrorContext(&err).to_string(), started, "put")
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            key,
            size_bytes = size,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let started = Instant::now();
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key())
                {
                    StorageError::NotFound(key.to_string())
                } else {
                    self.backend_error(key, DisplayErrorContext(&err).to_string(), started, "get")
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| self.backend_error(key, err.to_string(), started, "read"))?
            .into_bytes();

        tracing::debug!(
            bucket = %self.bucket,
            key,
            size_bytes = bytes.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "S3 get successful"
        );
        Ok(bytes.to_vec())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        let started = Instant::now();
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                self.backend_error(key, DisplayErrorContext(&err).to_string(), started, "delete")
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            key,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );
        Ok(())
    }
}

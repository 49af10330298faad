//! Object storage behind a small async trait.
//!
//! `S3Store` talks to AWS S3 or MinIO; tests use `memory::MemoryStore`.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::StorageConfig;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object storage request failed: {0}")]
    Backend(String),
}

/// Metadata for a listed object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Every object whose key starts with `prefix`, across all result pages.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// `s3://bucket/key`, the pointer recorded alongside stored files.
pub fn storage_url(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs a client configured for MinIO (custom endpoint, path-style)
    /// or AWS (default endpoint). Static credentials are used when both keys
    /// are configured, otherwise the default AWS provider chain applies.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "resume-api-static",
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        info!(bucket = %config.bucket, "S3 client initialized");
        Self::new(Client::from_conf(s3_config), config.bucket.clone())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put {key}: {}", DisplayErrorContext(&e))))?;

        debug!("Uploaded {size} bytes to s3://{}/{key}", self.bucket);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Backend(format!("get {key}: {}", DisplayErrorContext(&e)))
                }
            })?;

        let content_type = response.content_type().map(String::from);
        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("read {key}: {e}")))?
            .into_bytes();

        Ok(StoredObject { body, content_type })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| {
                    StorageError::Backend(format!("list {prefix}: {}", DisplayErrorContext(&e)))
                })?;

            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let last_modified = object
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
                    .unwrap_or_else(Utc::now);
                objects.push(ObjectInfo {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified,
                });
            }

            match (page.is_truncated(), page.next_continuation_token()) {
                (Some(true), Some(token)) => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("delete {key}: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }
}

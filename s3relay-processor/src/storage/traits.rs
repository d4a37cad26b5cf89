//! Storage backend traits

use async_trait::async_trait;
use bytes::Bytes;
use s3relay_core::{ErrorKind, RelayError};
use thiserror::Error;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BucketNotFound(_) | Self::ObjectNotFound { .. } => ErrorKind::NotFound,
            Self::AccessDenied { .. } => ErrorKind::Forbidden,
            Self::Upstream(_) => ErrorKind::UpstreamError,
        }
    }
}

impl From<StorageError> for RelayError {
    fn from(err: StorageError) -> Self {
        RelayError::new(err.kind(), err.to_string())
    }
}

/// A stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub etag: String,
    pub content_type: Option<String>,
}

/// Result of a PUT operation
#[derive(Debug, Clone)]
pub struct PutObjectResult {
    pub etag: String,
}

/// Abstract storage backend trait
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Get an object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError>;

    /// Put an object, overwriting any existing one at the same key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<String>,
    ) -> Result<PutObjectResult, StorageError>;
}

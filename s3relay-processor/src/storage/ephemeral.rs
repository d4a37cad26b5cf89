//! In-memory ephemeral storage backend

use super::traits::{ObjectStorage, PutObjectResult, StorageError, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use md5::{Digest, Md5};
use std::sync::Arc;

/// In-memory stored object
struct InMemoryObject {
    data: Bytes,
    etag: String,
    content_type: Option<String>,
}

/// In-memory bucket
struct InMemoryBucket {
    objects: DashMap<String, InMemoryObject>,
}

impl InMemoryBucket {
    fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }
}

/// Ephemeral (in-memory) storage backend
///
/// Buckets must be created explicitly before objects can be written to them,
/// mirroring a real store where the output bucket is provisioned out of band.
pub struct EphemeralStorage {
    buckets: DashMap<String, Arc<InMemoryBucket>>,
    denied: DashSet<String>,
}

impl Default for EphemeralStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemeralStorage {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            denied: DashSet::new(),
        }
    }

    /// Create a bucket; creating an existing bucket is a no-op
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(InMemoryBucket::new()));
    }

    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    /// Reject every subsequent read and write against `bucket` with `AccessDenied`
    pub fn deny_access(&self, bucket: &str) {
        self.denied.insert(bucket.to_string());
    }

    /// Sorted keys currently stored in `bucket`
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .buckets
            .get(bucket)
            .map(|b| b.objects.iter().map(|o| o.key().clone()).collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn compute_etag(data: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(data);
        format!("\"{}\"", hex::encode(hasher.finalize()))
    }

    fn bucket(&self, bucket: &str, key: &str) -> Result<Arc<InMemoryBucket>, StorageError> {
        if self.denied.contains(bucket) {
            return Err(StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        self.buckets
            .get(bucket)
            .map(|b| Arc::clone(b.value()))
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for EphemeralStorage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        let bucket_ref = self.bucket(bucket, key)?;

        let obj = bucket_ref
            .objects
            .get(key)
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        Ok(StoredObject {
            data: obj.data.clone(),
            etag: obj.etag.clone(),
            content_type: obj.content_type.clone(),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<String>,
    ) -> Result<PutObjectResult, StorageError> {
        let bucket_ref = self.bucket(bucket, key)?;

        let etag = Self::compute_etag(&data);

        bucket_ref.objects.insert(
            key.to_string(),
            InMemoryObject {
                data,
                etag: etag.clone(),
                content_type,
            },
        );

        Ok(PutObjectResult { etag })
    }
}

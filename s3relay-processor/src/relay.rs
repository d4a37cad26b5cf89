//! Object relay: read one object, pass it through, write it under `processed/`

use bytes::Bytes;
use s3relay_core::RelayError;
use std::sync::Arc;
use tracing::info;

use crate::storage::{ObjectStorage, StoredObject};

/// Prefix every relayed object is written under in the output bucket
pub const OUTPUT_PREFIX: &str = "processed/";

/// Destination key for a relayed object
pub fn output_key(key: &str) -> String {
    format!("{OUTPUT_PREFIX}{key}")
}

/// Where a relayed object ended up
#[derive(Debug, Clone)]
pub struct RelayOutcome {
    pub output_bucket: String,
    pub output_key: String,
    pub size: usize,
    pub etag: String,
}

/// Reads objects from a source bucket and writes them to the output bucket
pub struct Relay {
    storage: Arc<dyn ObjectStorage>,
    output_bucket: Option<String>,
}

impl Relay {
    pub fn new(storage: Arc<dyn ObjectStorage>, output_bucket: impl Into<String>) -> Self {
        Self {
            storage,
            output_bucket: Some(output_bucket.into()),
        }
    }

    /// A relay with no destination; every call fails with `ConfigMissing`
    pub fn unconfigured(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage,
            output_bucket: None,
        }
    }

    pub fn output_bucket(&self) -> Option<&str> {
        self.output_bucket.as_deref()
    }

    /// Copy `bucket/key` to `<output bucket>/processed/<key>`.
    ///
    /// The read completes before the write starts. A failed read writes
    /// nothing; a failed write leaves no partial state to clean up.
    pub async fn relay(&self, bucket: &str, key: &str) -> Result<RelayOutcome, RelayError> {
        let output_bucket = self
            .output_bucket
            .as_deref()
            .ok_or_else(RelayError::config_missing)?;

        info!("Processing object bucket={}, key={}", bucket, key);
        let object = self.storage.get_object(bucket, key).await?;
        let content_type = object.content_type.clone();
        let data = process(object);

        let output_key = output_key(key);
        let size = data.len();
        let put = self
            .storage
            .put_object(output_bucket, &output_key, data, content_type)
            .await?;
        info!(size, "Wrote processed object to {}/{}", output_bucket, output_key);

        Ok(RelayOutcome {
            output_bucket: output_bucket.to_string(),
            output_key,
            size,
            etag: put.etag,
        })
    }
}

// Pass-through: no transformation is defined for relayed objects.
fn process(object: StoredObject) -> Bytes {
    object.data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EphemeralStorage, PutObjectResult, StorageError};
    use s3relay_core::ErrorKind;

    fn setup() -> (Arc<EphemeralStorage>, Relay) {
        let storage = Arc::new(EphemeralStorage::new());
        storage.create_bucket("src");
        storage.create_bucket("dst");
        let relay = Relay::new(storage.clone(), "dst");
        (storage, relay)
    }

    #[test]
    fn test_output_key() {
        assert_eq!(output_key("a.txt"), "processed/a.txt");
        assert_eq!(output_key("dir/nested/b.bin"), "processed/dir/nested/b.bin");
    }

    #[tokio::test]
    async fn test_relay_copies_object_verbatim() {
        let (storage, relay) = setup();
        storage
            .put_object("src", "a.txt", Bytes::from("hello"), Some("text/plain".to_string()))
            .await
            .unwrap();

        let outcome = relay.relay("src", "a.txt").await.unwrap();
        assert_eq!(outcome.output_bucket, "dst");
        assert_eq!(outcome.output_key, "processed/a.txt");
        assert_eq!(outcome.size, 5);

        let written = storage.get_object("dst", "processed/a.txt").await.unwrap();
        assert_eq!(&written.data[..], b"hello");
        assert_eq!(written.content_type.as_deref(), Some("text/plain"));
        assert_eq!(written.etag, outcome.etag);
        assert_eq!(storage.keys("dst"), vec!["processed/a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_relay_binary_payload() {
        let (storage, relay) = setup();
        let payload: Vec<u8> = vec![0, 159, 146, 150, 255, 0, 10];
        storage
            .put_object("src", "blob", Bytes::from(payload.clone()), None)
            .await
            .unwrap();

        relay.relay("src", "blob").await.unwrap();

        let written = storage.get_object("dst", "processed/blob").await.unwrap();
        assert_eq!(written.data.to_vec(), payload);
    }

    #[tokio::test]
    async fn test_relay_is_idempotent() {
        let (storage, relay) = setup();
        storage.put_object("src", "a.txt", Bytes::from("hello"), None).await.unwrap();

        let first = relay.relay("src", "a.txt").await.unwrap();
        let second = relay.relay("src", "a.txt").await.unwrap();
        assert_eq!(first.etag, second.etag);

        let written = storage.get_object("dst", "processed/a.txt").await.unwrap();
        assert_eq!(&written.data[..], b"hello");
        assert_eq!(storage.keys("dst").len(), 1);
    }

    #[tokio::test]
    async fn test_relay_into_same_bucket() {
        let storage = Arc::new(EphemeralStorage::new());
        storage.create_bucket("shared");
        storage.put_object("shared", "a.txt", Bytes::from("hello"), None).await.unwrap();
        let relay = Relay::new(storage.clone(), "shared");

        relay.relay("shared", "a.txt").await.unwrap();
        assert_eq!(
            storage.keys("shared"),
            vec!["a.txt".to_string(), "processed/a.txt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_source_writes_nothing() {
        let (storage, relay) = setup();

        let err = relay.relay("src", "missing.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(storage.keys("dst").is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_bucket() {
        let (storage, relay) = setup();

        let err = relay.relay("nope", "a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(storage.keys("dst").is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_bucket_is_not_found() {
        let storage = Arc::new(EphemeralStorage::new());
        storage.create_bucket("src");
        storage.put_object("src", "a.txt", Bytes::from("hello"), None).await.unwrap();
        let relay = Relay::new(storage, "dst");

        let err = relay.relay("src", "a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("dst"));
    }

    #[tokio::test]
    async fn test_denied_write() {
        let (storage, relay) = setup();
        storage.put_object("src", "a.txt", Bytes::from("hello"), None).await.unwrap();
        storage.deny_access("dst");

        let err = relay.relay("src", "a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    /// Backend whose every call fails below the service-error level
    struct FailingStorage;

    #[async_trait::async_trait]
    impl ObjectStorage for FailingStorage {
        async fn get_object(&self, _bucket: &str, _key: &str) -> Result<StoredObject, StorageError> {
            Err(StorageError::Upstream("connection reset".into()))
        }

        async fn put_object(
            &self,
            _bucket: &str,
            _key: &str,
            _data: Bytes,
            _content_type: Option<String>,
        ) -> Result<PutObjectResult, StorageError> {
            Err(StorageError::Upstream("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let relay = Relay::new(Arc::new(FailingStorage), "dst");

        let err = relay.relay("src", "a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamError);
        assert_eq!(err.http_status(), 502);
        assert!(err.message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_unconfigured_relay_fails_before_reading() {
        let storage = Arc::new(EphemeralStorage::new());
        storage.create_bucket("src");
        storage.put_object("src", "a.txt", Bytes::from("hello"), None).await.unwrap();
        storage.deny_access("src");
        let relay = Relay::unconfigured(storage);

        // ConfigMissing rather than Forbidden: no storage call was made
        let err = relay.relay("src", "a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConfigMissing);
        assert!(err.message.contains("OUTPUT_BUCKET"));
        assert!(relay.output_bucket().is_none());
    }
}

//! AWS S3 storage backend

use super::traits::{ObjectStorage, PutObjectResult, StorageError, StoredObject};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

/// Connection settings for [`S3Storage`]
///
/// Credentials and region always come from the default AWS provider chain.
#[derive(Debug, Clone, Default)]
pub struct S3StorageConfig {
    /// Endpoint override for S3-compatible stores (MinIO, LocalStack, ...)
    pub endpoint_url: Option<String>,
    /// Use `https://host/bucket/key` addressing instead of virtual hosts
    pub force_path_style: bool,
}

/// S3 storage backed by the AWS SDK client
#[derive(Clone, Debug)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Build a client from the ambient AWS configuration
    pub async fn connect(config: &S3StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self::from_client(Client::from_conf(builder.build()))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(&e, bucket, key))?;

        let etag = output.e_tag().unwrap_or_default().to_string();
        let content_type = output.content_type().map(String::from);

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Upstream(format!("failed to read object body: {e}")))?
            .into_bytes();

        debug!(bucket = %bucket, key = %key, size = data.len(), "Fetched object");
        Ok(StoredObject {
            data,
            etag,
            content_type,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<String>,
    ) -> Result<PutObjectResult, StorageError> {
        let size = data.len();
        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(&e, bucket, key))?;

        debug!(bucket = %bucket, key = %key, size, "Stored object");
        Ok(PutObjectResult {
            etag: output.e_tag().unwrap_or_default().to_string(),
        })
    }
}

fn classify<E>(err: &SdkError<E>, bucket: &str, key: &str) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.as_service_error().and_then(ProvideErrorMetadata::code);
    let status = err.raw_response().map(|r| r.status().as_u16());
    classify_code(code, status, bucket, key, DisplayErrorContext(err).to_string())
}

/// Map an S3 error code (or bare HTTP status) onto a storage error
fn classify_code(
    code: Option<&str>,
    status: Option<u16>,
    bucket: &str,
    key: &str,
    message: String,
) -> StorageError {
    match (code, status) {
        (Some("NoSuchKey" | "NotFound"), _) | (None, Some(404)) => StorageError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        (Some("NoSuchBucket"), _) => StorageError::BucketNotFound(bucket.to_string()),
        (Some("AccessDenied" | "Forbidden" | "AllAccessDisabled"), _) | (None, Some(403)) => {
            StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        }
        _ => StorageError::Upstream(message),
    }
}

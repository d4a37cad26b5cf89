//! Test server management

use bytes::Bytes;
use portpicker::pick_unused_port;
use s3relay::{create_router, AppState};
use s3relay_processor::storage::{EphemeralStorage, ObjectStorage, StorageError};
use s3relay_processor::Relay;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::{RelayClient, OUTPUT_BUCKET, SOURCE_BUCKET, STARTUP_TIMEOUT_SECS};

/// A relay service running in-process over in-memory storage
pub struct TestServer {
    handle: JoinHandle<()>,
    port: u16,
    base_url: String,
    storage: Arc<EphemeralStorage>,
}

impl TestServer {
    /// Start a server with `src` and `dst` buckets, relaying into `dst`
    pub async fn start() -> Result<Self, TestError> {
        let storage = Arc::new(EphemeralStorage::new());
        storage.create_bucket(SOURCE_BUCKET);
        storage.create_bucket(OUTPUT_BUCKET);
        Self::start_with(storage, Some(OUTPUT_BUCKET)).await
    }

    /// Start a server over `storage`; `None` leaves the output bucket unconfigured
    pub async fn start_with(
        storage: Arc<EphemeralStorage>,
        output_bucket: Option<&str>,
    ) -> Result<Self, TestError> {
        let port = pick_unused_port().ok_or(TestError::NoPortAvailable)?;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| TestError::StartFailed(e.to_string()))?;

        let backend: Arc<dyn ObjectStorage> = storage.clone();
        let relay = match output_bucket {
            Some(bucket) => Relay::new(backend, bucket),
            None => Relay::unconfigured(backend),
        };
        let app = create_router(AppState::new(relay));

        info!(port = port, "Starting s3relay test server");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("test server stopped: {}", e);
            }
        });

        let base_url = format!("http://127.0.0.1:{port}");
        let server = Self {
            handle,
            port,
            base_url,
            storage,
        };

        // Wait for server to be ready
        let client = server.client();
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_secs(STARTUP_TIMEOUT_SECS) {
            if let Ok(true) = client.health().await {
                info!(port = port, "s3relay ready");
                return Ok(server);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Err(TestError::StartupTimeout)
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The in-memory store behind the server
    pub fn storage(&self) -> &Arc<EphemeralStorage> {
        &self.storage
    }

    /// Write an object straight into the backing store, creating the bucket
    pub async fn seed(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Vec<u8>>,
    ) -> Result<(), StorageError> {
        let data: Vec<u8> = data.into();
        self.storage.create_bucket(bucket);
        self.storage
            .put_object(bucket, key, Bytes::from(data), None)
            .await
            .map(|_| ())
    }

    /// Read an object straight from the backing store
    pub async fn fetch(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.storage
            .get_object(bucket, key)
            .await
            .ok()
            .map(|o| o.data.to_vec())
    }

    /// Get a client for the relay endpoint
    pub fn client(&self) -> RelayClient {
        RelayClient::new(self.base_url.clone())
    }

}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Errors that can occur with test server
#[derive(Debug, Error)]
pub enum TestError {
    #[error("No available port found")]
    NoPortAvailable,

    #[error("Failed to start server: {0}")]
    StartFailed(String),

    #[error("Server startup timed out")]
    StartupTimeout,
}

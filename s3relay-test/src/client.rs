//! Client for interacting with a running relay service

use reqwest::Client;
use s3relay_core::{StatusBody, REQUEST_ID_HEADER};
use thiserror::Error;

/// Client for the relay endpoint
pub struct RelayClient {
    base_url: String,
    client: Client,
}

/// Response of a relay call
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: u16,
    pub request_id: Option<String>,
    pub body: StatusBody,
}

impl RelayClient {
    /// Create a new client
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Relay `bucket/key` through the service
    pub async fn process(&self, bucket: &str, key: &str) -> Result<RelayResponse, ClientError> {
        let body = serde_json::json!({ "bucket": bucket, "key": key }).to_string();
        self.process_raw(body).await
    }

    /// Send an arbitrary body to the relay endpoint
    pub async fn process_raw(&self, body: impl Into<String>) -> Result<RelayResponse, ClientError> {
        let url = format!("{}/api/s3-processor", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body.into())
            .send()
            .await?;

        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let text = response.text().await?;
        let body = serde_json::from_str(&text)
            .map_err(|e| ClientError::ParseError(format!("{e}: {text}")))?;

        Ok(RelayResponse {
            status,
            request_id,
            body,
        })
    }

    /// Whether the health endpoint answers with a success status
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

//! HTTP router for the relay service

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use s3relay_processor::{
    handlers::{self, ProcessorState, PROCESS_PATH},
    storage::{EphemeralStorage, ObjectStorage, S3Storage, S3StorageConfig},
    Relay,
};

use crate::config::{Config, StorageConfig};

/// Service state for the main router
pub struct AppState {
    processor: Arc<ProcessorState>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            processor: Arc::new(ProcessorState { relay }),
        }
    }

    /// Build the storage backend and relay described by `config`
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let output_bucket = config.require_output_bucket()?;

        let storage: Arc<dyn ObjectStorage> = match &config.storage {
            StorageConfig::S3 {
                endpoint,
                force_path_style,
            } => {
                info!(
                    endpoint = endpoint.as_deref().unwrap_or("default"),
                    force_path_style, "Using S3 storage"
                );
                let s3_config = S3StorageConfig {
                    endpoint_url: endpoint.clone(),
                    force_path_style: *force_path_style,
                };
                Arc::new(S3Storage::connect(&s3_config).await)
            }
            StorageConfig::Ephemeral { buckets } => {
                info!(buckets = ?buckets, "Using ephemeral storage");
                let storage = EphemeralStorage::new();
                storage.create_bucket(output_bucket);
                for bucket in buckets {
                    storage.create_bucket(bucket);
                }
                Arc::new(storage)
            }
        };

        Ok(Self::new(Relay::new(storage, output_bucket)))
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(PROCESS_PATH, post(handlers::handle_process))
        .layer(TraceLayer::new_for_http())
        .with_state(state.processor)
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"status":"running"}"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use s3relay_core::StatusBody;
    use tower::ServiceExt;

    async fn ephemeral_state(buckets: &[&str]) -> AppState {
        let config = Config {
            output_bucket: Some("dst".to_string()),
            storage: StorageConfig::Ephemeral {
                buckets: buckets.iter().map(|b| (*b).to_string()).collect(),
            },
            ..Config::default()
        };
        AppState::from_config(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(ephemeral_state(&[]).await);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"status":"running"}"#);
    }

    #[tokio::test]
    async fn test_process_route_requires_post() {
        let app = create_router(ephemeral_state(&[]).await);
        let response = app
            .oneshot(Request::builder().uri(PROCESS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_missing_source_bucket_is_not_found() {
        let app = create_router(ephemeral_state(&["src"]).await);
        let request = Request::builder()
            .method("POST")
            .uri(PROCESS_PATH)
            .body(Body::from(r#"{"bucket":"other","key":"a.txt"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: StatusBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.code.as_deref(), Some("NotFound"));
    }

    #[tokio::test]
    async fn test_from_config_requires_output_bucket() {
        let config = Config {
            storage: StorageConfig::Ephemeral { buckets: Vec::new() },
            ..Config::default()
        };
        let err = AppState::from_config(&config).await.err().unwrap();
        assert!(err.to_string().contains("OUTPUT_BUCKET"));
    }
}

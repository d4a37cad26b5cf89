//! Relay HTTP request handler

use axum::{
    body::Body,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use s3relay_core::{RelayError, RequestId, StatusBody, REQUEST_ID_HEADER};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

use crate::relay::Relay;

/// Path the relay endpoint is mounted at
pub const PROCESS_PATH: &str = "/api/s3-processor";

/// Shared state for the relay handler
pub struct ProcessorState {
    pub relay: Relay,
}

/// Body of a relay request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRequest {
    pub bucket: String,
    pub key: String,
}

impl ObjectRequest {
    /// Parse and validate a raw request body
    pub fn from_body(body: &[u8]) -> Result<Self, RelayError> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| RelayError::bad_request(format!("invalid request body: {e}")))?;

        if request.bucket.is_empty() {
            return Err(RelayError::bad_request("bucket must not be empty"));
        }
        if request.key.is_empty() {
            return Err(RelayError::bad_request("key must not be empty"));
        }
        Ok(request)
    }
}

/// Handle `POST /api/s3-processor`
///
/// Body extraction failures (including bodies over the default size limit)
/// answer with the same JSON error shape and request id as any other failure.
pub async fn handle_process(
    State(state): State<Arc<ProcessorState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(RequestId::new, RequestId::with_id);

    let span = info_span!("relay", request_id = %request_id);
    let result = match body {
        Ok(body) => process(&state, &body).instrument(span).await,
        Err(rejection) => Err(RelayError::bad_request(format!(
            "invalid request body: {}",
            rejection.body_text()
        ))),
    };

    let response = match result {
        Ok(()) => json_response(StatusCode::OK, &StatusBody::ok()),
        Err(e) => {
            error!(
                request_id = %request_id,
                kind = %e.kind,
                "Error processing S3 object: {}",
                e.message
            );
            let status = StatusCode::from_u16(e.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_response(status, &StatusBody::error(&e))
        }
    };
    with_request_id(response, &request_id)
}

async fn process(state: &ProcessorState, body: &[u8]) -> Result<(), RelayError> {
    let request = ObjectRequest::from_body(body)?;
    let outcome = state.relay.relay(&request.bucket, &request.key).await?;
    info!(
        output_bucket = %outcome.output_bucket,
        output_key = %outcome.output_key,
        size = outcome.size,
        "Relay complete"
    );
    Ok(())
}

// === Helper Functions ===

fn json_response(status: StatusCode, body: &StatusBody) -> Response {
    let json = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"status":"error","message":"failed to encode response"}"#.to_string());

    let mut response = Response::new(Body::from(json));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

fn with_request_id(mut response: Response, request_id: &RequestId) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

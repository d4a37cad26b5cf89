//! Relay error kinds and JSON status formatting

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the destination bucket
pub const OUTPUT_BUCKET_VAR: &str = "OUTPUT_BUCKET";

/// Error kinds surfaced by the relay endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Body is not valid JSON or misses a required field
    BadRequest,
    /// Source bucket or object does not exist
    NotFound,
    /// The store denied access to the source or destination
    Forbidden,
    /// Required configuration (the output bucket) is absent
    ConfigMissing,
    /// Any other failure talking to the store
    UpstreamError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequest",
            Self::NotFound => "NotFound",
            Self::Forbidden => "Forbidden",
            Self::ConfigMissing => "ConfigMissing",
            Self::UpstreamError => "UpstreamError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::ConfigMissing => 500,
            Self::UpstreamError => 502,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single relay request
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct RelayError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RelayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn config_missing() -> Self {
        Self::new(
            ErrorKind::ConfigMissing,
            format!("output bucket is not configured; set {OUTPUT_BUCKET_VAR}"),
        )
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

/// JSON body returned by the relay endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
            code: None,
        }
    }

    pub fn error(err: &RelayError) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(err.message.clone()),
            code: Some(err.kind.as_str().to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::BadRequest.http_status(), 400);
        assert_eq!(ErrorKind::Forbidden.http_status(), 403);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::ConfigMissing.http_status(), 500);
        assert_eq!(ErrorKind::UpstreamError.http_status(), 502);
    }

    #[test]
    fn test_error_body_format() {
        let error = RelayError::new(ErrorKind::NotFound, "Object not found: src/a.txt");

        let json = serde_json::to_value(StatusBody::error(&error)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Object not found: src/a.txt");
        assert_eq!(json["code"], "NotFound");
    }

    #[test]
    fn test_config_missing_names_variable() {
        let error = RelayError::config_missing();
        assert_eq!(error.kind, ErrorKind::ConfigMissing);
        assert_eq!(error.http_status(), 500);
        assert!(error.message.contains("OUTPUT_BUCKET"));
    }

    #[test]
    fn test_ok_body_has_only_status() {
        let json = serde_json::to_string(&StatusBody::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }

    #[test]
    fn test_display_includes_kind() {
        let error = RelayError::bad_request("missing field `key`");
        assert_eq!(error.to_string(), "BadRequest: missing field `key`");
    }
}

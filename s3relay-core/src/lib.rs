//! Core types for s3relay
//!
//! This crate provides the error taxonomy and request identifiers shared by
//! the relay, its HTTP handler, and the server binary.

pub mod error;
pub mod request_id;

pub use error::{ErrorKind, RelayError, StatusBody, OUTPUT_BUCKET_VAR};
pub use request_id::{RequestId, REQUEST_ID_HEADER};

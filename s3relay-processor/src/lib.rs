//! Object relay for s3relay
//!
//! This crate reads an object from a source bucket, passes its bytes through
//! unchanged, and writes them under `processed/` in the output bucket. It also
//! provides the HTTP handler that drives a relay from a JSON request.

pub mod handlers;
pub mod relay;
pub mod storage;

pub use handlers::{ObjectRequest, ProcessorState};
pub use relay::{Relay, RelayOutcome, OUTPUT_PREFIX};

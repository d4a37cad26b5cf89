//! Test utilities for s3relay
//!
//! Provides utilities for end-to-end testing of the relay service:
//! - Start/stop the service in-process on a random port
//! - In-memory storage the test can seed and inspect
//! - A client for the relay and health endpoints
//!
//! ## Usage
//!
//! ```rust,ignore
//! use s3relay_test::TestServer;
//!
//! #[tokio::test]
//! async fn test_relay() {
//!     let server = TestServer::start().await.unwrap();
//!     server.seed("src", "a.txt", "hello").await.unwrap();
//!
//!     let response = server.client().process("src", "a.txt").await.unwrap();
//!     assert_eq!(response.status, 200);
//! }
//! ```

pub mod client;
pub mod server;

pub use client::{ClientError, RelayClient, RelayResponse};
pub use server::{TestError, TestServer};

/// Source bucket created by [`TestServer::start`]
pub const SOURCE_BUCKET: &str = "src";

/// Output bucket configured by [`TestServer::start`]
pub const OUTPUT_BUCKET: &str = "dst";

/// Timeout for waiting on the server
pub const STARTUP_TIMEOUT_SECS: u64 = 10;

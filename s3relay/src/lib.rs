//! s3relay service wiring
//!
//! Configuration loading and the HTTP router. The binary in `main.rs` only
//! parses arguments, installs tracing, and serves the router.

pub mod config;
pub mod router;

pub use config::{Args, Config};
pub use router::{create_router, AppState};

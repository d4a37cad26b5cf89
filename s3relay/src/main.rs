//! s3relay - relay objects into a processed/ prefix
//!
//! Accepts `POST /api/s3-processor` with `{"bucket": ..., "key": ...}` and
//! copies that object to `processed/<key>` in the configured output bucket.

use clap::Parser;
use s3relay::{create_router, AppState, Args, Config};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_args(args)?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("s3relay={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Fail fast on missing configuration
    let output_bucket = config.require_output_bucket()?;

    info!("Starting s3relay...");
    info!("  Output bucket: {}", output_bucket);
    info!("  Storage: {:?}", config.storage);

    let state = AppState::from_config(&config).await?;
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). Deployments normally run the workspace's main `transtrack-run`
//! binary instead.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use transtrack_core::{resolve_data_dir, CoreConfig};

/// Main entry point for the TransTrack REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `TRANSTRACK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `TRANSTRACK_DATA_DIR`: Directory for waitlist data storage
/// - `TRANSTRACK_API_KEY`: Expected `x-api-key` value; unset leaves the instance open
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("TRANSTRACK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = resolve_data_dir(std::env::var("TRANSTRACK_DATA_DIR").ok().map(PathBuf::from));
    let api_key = std::env::var("TRANSTRACK_API_KEY").ok();

    tracing::info!("-- Starting TransTrack REST API on {}", addr);
    tracing::info!("-- Waitlist data directory: {}", data_dir.display());
    if api_key.is_none() {
        tracing::warn!("TRANSTRACK_API_KEY is not set; running as an open instance");
    }

    let state = AppState::new(Arc::new(CoreConfig::new(data_dir)), api_key);
    api_rest::serve(&addr, state).await
}

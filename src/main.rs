use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use transtrack_core::{resolve_data_dir, CoreConfig};

/// Main entry point for the TransTrack application
///
/// Starts the REST server with the Swagger UI and serves the waitlist, scoring,
/// matching, notification and user routes against the configured data directory.
///
/// Protected routes require authentication via the x-api-key header when
/// `TRANSTRACK_API_KEY` is set; `/health` and the API docs are always open.
///
/// # Environment Variables
/// - `TRANSTRACK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TRANSTRACK_DATA_DIR`: Directory for waitlist data storage (default: "transtrack_data")
/// - `TRANSTRACK_API_KEY`: Expected `x-api-key` value; unset leaves the instance open
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("transtrack=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("TRANSTRACK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = resolve_data_dir(std::env::var("TRANSTRACK_DATA_DIR").ok().map(PathBuf::from));
    let api_key = std::env::var("TRANSTRACK_API_KEY").ok();

    tracing::info!("++ Starting TransTrack REST on {}", rest_addr);
    tracing::info!("++ Waitlist data directory: {}", data_dir.display());
    if api_key.is_none() {
        tracing::warn!("TRANSTRACK_API_KEY is not set; running as an open instance");
    }

    let state = AppState::new(Arc::new(CoreConfig::new(data_dir)), api_key);
    api_rest::serve(&rest_addr, state).await
}

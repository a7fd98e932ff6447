//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `frontdesk-run` binary
//! serves the same router.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{config_from_env, router, AppState};

/// Main entry point for the front desk REST API server.
///
/// # Environment Variables
/// - `FRONTDESK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `FRONTDESK_DATA_DIR`, `FRONTDESK_BASE_DIR`, `FRONTDESK_STATIC_*`, `FRONTDESK_MEDIA_*`,
///   `FRONTDESK_PUBLIC_URL`: storage and asset locations
/// - `FRONTDESK_FONT_FILE`: TrueType font for document text beyond Western European
/// - `API_KEY`: optional key required in `x-api-key`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
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

    let addr = std::env::var("FRONTDESK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting front desk REST API on {}", addr);

    let cfg = Arc::new(config_from_env()?);
    tracing::info!("Storing records in {}", cfg.data_dir().display());

    let state = AppState::new(cfg, std::env::var("API_KEY").ok());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

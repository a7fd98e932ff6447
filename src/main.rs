use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, config_from_env, router};
use api_shared::HealthService;
use frontdesk_core::PatientService;

/// Main entry point for the front desk application.
///
/// Resolves configuration once, reports the state of the record store and serves the
/// REST API (with Swagger UI under `/swagger-ui`).
///
/// # Environment Variables
/// - `FRONTDESK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `FRONTDESK_DATA_DIR`: Directory for record storage (default: "patient_data")
/// - `FRONTDESK_BASE_DIR`, `FRONTDESK_STATIC_URL`, `FRONTDESK_STATIC_ROOT`,
///   `FRONTDESK_MEDIA_URL`, `FRONTDESK_MEDIA_ROOT`: document asset locations
/// - `FRONTDESK_PUBLIC_URL`: base URL for resources not found on disk
/// - `FRONTDESK_FONT_FILE`: TrueType font for document text beyond Western European
/// - `API_KEY`: when set, required in the `x-api-key` header
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frontdesk=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("FRONTDESK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(config_from_env()?);
    let patient_count = PatientService::new(cfg.clone()).list()?.len();
    tracing::info!(
        "{} ({} patients in {})",
        HealthService::check_health().message,
        patient_count,
        cfg.data_dir().display()
    );

    let api_key = std::env::var("API_KEY").ok();
    if api_key.is_none() {
        tracing::warn!("API_KEY is not set; requests are accepted without a key");
    }

    let app = router(AppState::new(cfg, api_key));

    tracing::info!("-- Starting front desk REST API on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

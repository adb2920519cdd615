// Main entry point for the extraction API server

use std::sync::Arc;

use anyhow::{Context, Result};
use harvester::{ChromeDriverFactory, CsvExporter};
use server_core::server::{build_app, AppState};
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,harvester=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting map-feed extraction API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(export_dir = %config.export_dir.display(), "Configuration loaded");

    // Export directory is created up front so the first session cannot race
    // its own artifact write.
    let exporter = Arc::new(
        CsvExporter::new(&config.export_dir).context("Failed to prepare export directory")?,
    );

    let harvest_config = config.harvest_config();
    let driver_factory = Arc::new(ChromeDriverFactory::new(&harvest_config));

    let state = AppState::new(exporter, driver_factory, harvest_config);
    let app = build_app(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

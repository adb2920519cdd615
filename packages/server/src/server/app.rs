//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use harvester::{CsvExporter, DriverFactory, HarvestConfig, SessionRegistry};

use crate::server::routes::{
    download_handler, export_handler, health_handler, scrape_handler, stop_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub exporter: Arc<CsvExporter>,
    pub driver_factory: Arc<dyn DriverFactory>,
    pub harvest_config: HarvestConfig,
}

impl AppState {
    pub fn new(
        exporter: Arc<CsvExporter>,
        driver_factory: Arc<dyn DriverFactory>,
        harvest_config: HarvestConfig,
    ) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            exporter,
            driver_factory,
            harvest_config,
        }
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    // CORS: the frontend runs on a different origin in every deployment.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/scrape", post(scrape_handler))
        .route("/stop-scraping/:session_id", post(stop_handler))
        .route("/export", post(export_handler))
        .route("/download/:filename", get(download_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

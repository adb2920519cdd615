//! Direct export endpoint.
//!
//! POST /export {results: Listing[]}
//!
//! Serializes an already-held record set to an artifact, bypassing the
//! session machinery entirely. Used by clients that want a file from the
//! results they are currently displaying.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use harvester::Listing;

use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub results: Vec<Listing>,
}

pub async fn export_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ExportRequest>,
) -> Response {
    match state.exporter.export(&request.results) {
        Ok(filename) => (StatusCode::OK, Json(json!({ "filename": filename }))).into_response(),
        Err(e) => {
            error!(error = %e, "direct export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create export file" })),
            )
                .into_response()
        }
    }
}

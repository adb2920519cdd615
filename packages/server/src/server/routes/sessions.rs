//! Stop endpoint.
//!
//! POST /stop-scraping/:session_id
//!
//! Flips the session's liveness flag; the stream itself stays open until the
//! extraction loop observes the flag and sends its final frame. A miss is a
//! 404, distinct from the acknowledgment.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use harvester::CancelOutcome;

use crate::server::app::AppState;

pub async fn stop_handler(
    Extension(state): Extension<AppState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.registry.cancel(&session_id) {
        CancelOutcome::Stopped => {
            info!(session_id = %session_id, "stop requested");
            (
                StatusCode::OK,
                Json(json!({ "message": "Scraping will stop after current batch" })),
            )
        }
        CancelOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Session not found" })),
        ),
    }
}

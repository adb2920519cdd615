//! Artifact download endpoint.
//!
//! GET /download/:filename
//!
//! Streams the named artifact as an attachment and deletes it after a
//! successful read; artifacts are single-use, owned by whoever downloads
//! them. Unknown names, and anything that is not a bare filename, are a 404.

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::server::app::AppState;

pub async fn download_handler(
    Extension(state): Extension<AppState>,
    Path(filename): Path<String>,
) -> Response {
    if !is_bare_filename(&filename) {
        return not_found();
    }

    let path = state.exporter.dir().join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(filename = %filename, error = %e, "artifact not deleted after download");
            }
            info!(filename = %filename, bytes = bytes.len(), "artifact downloaded");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(_) => not_found(),
    }
}

fn is_bare_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "File not found" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_filenames_only() {
        assert!(is_bare_filename("results_1700000000000.csv"));
        assert!(!is_bare_filename(""));
        assert!(!is_bare_filename("../secret.csv"));
        assert!(!is_bare_filename("a/b.csv"));
        assert!(!is_bare_filename("a\\b.csv"));
    }
}

//! Streaming scrape endpoint.
//!
//! POST /scrape {keyword, location?}
//!
//! Validates synchronously, registers a session, then answers with a
//! newline-delimited JSON stream of progress frames. The first frame carries
//! the session id (the client needs it to stop the stream); the last has
//! `isComplete: true`. The extraction itself runs in a spawned task feeding
//! the response channel, so the response starts before the browser does.

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{error, info};

use harvester::{HarvestSession, ProgressFrame, SearchQuery};

use crate::server::app::AppState;
use crate::server::sink::ChannelSink;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub keyword: Option<String>,
    pub location: Option<String>,
}

pub async fn scrape_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Response {
    let keyword = request
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());
    let Some(keyword) = keyword else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Keyword is required" })),
        )
            .into_response();
    };
    let location = request
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    let query = SearchQuery::new(keyword, location);

    let session_id = state.registry.next_session_id();
    state.registry.register(&session_id);
    info!(session_id = %session_id, keyword = %query.keyword, "scrape request accepted");

    let (tx, rx) = mpsc::channel::<ProgressFrame>(16);
    let _ = tx.send(ProgressFrame::started(&session_id)).await;

    let session = HarvestSession::new(
        state.registry.clone(),
        session_id,
        state.harvest_config.clone(),
        state.exporter.clone(),
    );
    let factory = state.driver_factory.clone();
    tokio::spawn(async move {
        session
            .run(query, factory.as_ref(), Box::new(ChannelSink::new(tx)))
            .await;
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(frame_to_line));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body)
        .expect("static response parts are valid")
}

fn frame_to_line(frame: ProgressFrame) -> Result<Bytes, Infallible> {
    let mut line = serde_json::to_string(&frame).unwrap_or_else(|e| {
        error!(error = %e, "frame serialization failed");
        String::from("{}")
    });
    line.push('\n');
    Ok(Bytes::from(line))
}

//! Progress emission.
//!
//! The emitter is the cancellation checkpoint between the loop and the
//! transport: every non-terminal emit first consults the session registry,
//! and a stopped (or already removed) session turns the emit into a
//! `Cancelled` error instead of a write. Terminal frames skip that check:
//! a cancelled session still gets its final frame and artifact name.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{HarvestError, Result};
use crate::registry::SessionRegistry;
use crate::types::{Listing, ProgressFrame};

/// Transport seam for one session's outbound frames.
///
/// One call, one self-delimited frame, independently flushed; there is no
/// buffering across calls. A send error means the far side went away.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send(&self, frame: ProgressFrame) -> std::result::Result<(), SinkClosed>;
}

/// The sink's only failure mode: the consumer disconnected.
#[derive(Debug, Clone, Copy)]
pub struct SinkClosed;

/// Formats and pushes progress frames for a single session.
pub struct ProgressEmitter {
    registry: Arc<SessionRegistry>,
    session_id: String,
    sink: Box<dyn FrameSink>,
}

impl ProgressEmitter {
    pub fn new(
        registry: Arc<SessionRegistry>,
        session_id: impl Into<String>,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        Self {
            registry,
            session_id: session_id.into(),
            sink,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Emit a non-terminal progress frame.
    ///
    /// Fails with [`HarvestError::Cancelled`] when the session is absent or
    /// stopped; this is how a stop request interrupts an in-progress loop at
    /// its next checkpoint.
    pub async fn emit(&self, results: Vec<Listing>, message: impl Into<String>) -> Result<()> {
        if !self.registry.is_live(&self.session_id) {
            debug!(session_id = %self.session_id, "emit refused, session no longer live");
            return Err(HarvestError::Cancelled);
        }
        self.write(ProgressFrame::progress(results, message)).await
    }

    /// Emit a terminal frame, bypassing the liveness check so every exit
    /// path can deliver its final snapshot.
    pub async fn emit_terminal(&self, frame: ProgressFrame) -> Result<()> {
        self.write(frame).await
    }

    async fn write(&self, frame: ProgressFrame) -> Result<()> {
        self.sink
            .send(frame)
            .await
            .map_err(|SinkClosed| HarvestError::SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    #[tokio::test]
    async fn emit_writes_while_session_is_live() {
        let registry = Arc::new(SessionRegistry::new());
        registry.register("s1");
        let sink = RecordingSink::new();
        let emitter = ProgressEmitter::new(registry, "s1", Box::new(sink.clone()));

        emitter.emit(Vec::new(), "Found 0 results...").await.unwrap();

        let frames = sink.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].message, "Found 0 results...");
        assert!(!frames[0].is_complete);
    }

    #[tokio::test]
    async fn emit_fails_once_session_is_stopped() {
        let registry = Arc::new(SessionRegistry::new());
        registry.register("s1");
        let sink = RecordingSink::new();
        let emitter = ProgressEmitter::new(registry.clone(), "s1", Box::new(sink.clone()));

        registry.cancel("s1");
        let err = emitter.emit(Vec::new(), "ignored").await.unwrap_err();
        assert!(err.is_cancellation());
        assert!(sink.frames().is_empty());
    }

    #[tokio::test]
    async fn emit_fails_for_removed_session() {
        let registry = Arc::new(SessionRegistry::new());
        registry.register("s1");
        registry.remove("s1");
        let sink = RecordingSink::new();
        let emitter = ProgressEmitter::new(registry, "s1", Box::new(sink.clone()));

        let err = emitter.emit(Vec::new(), "ignored").await.unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn terminal_frames_bypass_the_liveness_check() {
        let registry = Arc::new(SessionRegistry::new());
        registry.register("s1");
        registry.cancel("s1");
        let sink = RecordingSink::new();
        let emitter = ProgressEmitter::new(registry, "s1", Box::new(sink.clone()));

        emitter
            .emit_terminal(ProgressFrame::terminal(
                Vec::new(),
                "Extraction stopped. Found 0 results",
                Some("results_0.csv".into()),
            ))
            .await
            .unwrap();

        let frames = sink.frames();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_complete);
        assert_eq!(frames[0].filename.as_deref(), Some("results_0.csv"));
    }

    #[tokio::test]
    async fn closed_sink_surfaces_as_sink_closed() {
        let registry = Arc::new(SessionRegistry::new());
        registry.register("s1");
        let sink = RecordingSink::new().closed();
        let emitter = ProgressEmitter::new(registry, "s1", Box::new(sink));

        let err = emitter.emit(Vec::new(), "ignored").await.unwrap_err();
        assert!(matches!(err, HarvestError::SinkClosed));
    }
}

//! Channel-backed frame sink.
//!
//! The scrape handler hands the receiving half to the response body stream;
//! the extraction session pushes frames through this sink. A dropped
//! receiver means the client went away; that surfaces as `SinkClosed`,
//! which the session treats as a terminal condition.

use async_trait::async_trait;
use harvester::{FrameSink, ProgressFrame, SinkClosed};
use tokio::sync::mpsc;

/// `FrameSink` over an mpsc channel of frames.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressFrame>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressFrame>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&self, frame: ProgressFrame) -> Result<(), SinkClosed> {
        self.tx.send(frame).await.map_err(|_| SinkClosed)
    }
}

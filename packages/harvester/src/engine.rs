//! The incremental extraction session.
//!
//! Two layers live here. [`ScrollExtractLoop`] is the per-cycle state
//! machine: extract the visible window, emit progress, scroll, detect
//! stagnation, decide termination. [`HarvestSession`] wraps it with the
//! retry-guarded load and the terminal bookkeeping every exit path owes the
//! caller: an export artifact, a final frame, a closed driver, and a removed
//! registry entry.
//!
//! Cancellation is cooperative. The liveness flag is read at the start of a
//! cycle and before each non-terminal emit, never mid-extraction, so a cycle
//! in progress always completes its extraction before honoring a stop.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::HarvestConfig;
use crate::driver::{DriverFactory, PageDriver};
use crate::emitter::{FrameSink, ProgressEmitter};
use crate::error::{HarvestError, Result};
use crate::export::CsvExporter;
use crate::loader::load_results;
use crate::normalizer::normalize;
use crate::registry::SessionRegistry;
use crate::types::{Listing, ProgressFrame, SearchQuery};

/// Why the scroll/extract loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The session's liveness flag was down at a cycle boundary.
    Cancelled,
    /// Item count stagnated and no "show more" control exists.
    NoMoreResults,
    /// The scroll budget ran out.
    MaxScrollsReached,
    /// The configured result cap was met.
    MaxResultsReached,
}

/// Loop state. Each cycle walks Extracting → Scrolling (→ Stalled) and back,
/// until some transition lands on Terminated.
#[derive(Debug)]
enum ScrapePhase {
    Extracting,
    Scrolling,
    Stalled,
    Terminated(TerminationReason),
}

/// The scroll/extract cycle over one session's page driver.
pub struct ScrollExtractLoop<'a> {
    driver: &'a dyn PageDriver,
    emitter: &'a ProgressEmitter,
    registry: &'a SessionRegistry,
    session_id: &'a str,
    config: &'a HarvestConfig,
}

impl<'a> ScrollExtractLoop<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        emitter: &'a ProgressEmitter,
        registry: &'a SessionRegistry,
        session_id: &'a str,
        config: &'a HarvestConfig,
    ) -> Self {
        Self {
            driver,
            emitter,
            registry,
            session_id,
            config,
        }
    }

    /// Run cycles until a terminal transition.
    ///
    /// `records` is the session's accumulated set; it is REPLACED each cycle
    /// with the full re-read of the visible window (earlier items may mutate
    /// or reorder as the feed re-renders). On error the caller keeps
    /// whatever the last completed cycle accumulated.
    pub async fn run(&self, records: &mut Vec<Listing>) -> Result<TerminationReason> {
        let mut phase = ScrapePhase::Extracting;
        let mut scrolls: u32 = 0;
        let mut last_count: usize = 0;

        loop {
            phase = match phase {
                ScrapePhase::Extracting => {
                    if !self.registry.is_live(self.session_id) {
                        ScrapePhase::Terminated(TerminationReason::Cancelled)
                    } else {
                        let snapshots = self.driver.collect_items().await?;
                        *records = snapshots.iter().filter_map(normalize).collect();
                        debug!(
                            session_id = %self.session_id,
                            visible = snapshots.len(),
                            kept = records.len(),
                            "cycle extracted"
                        );
                        self.emitter
                            .emit(records.clone(), format!("Found {} results...", records.len()))
                            .await?;
                        ScrapePhase::Scrolling
                    }
                }
                ScrapePhase::Scrolling => {
                    self.driver.scroll_results_pane().await?;
                    sleep(self.config.scroll_settle).await;
                    let count = self.driver.item_count().await?;
                    if count == last_count {
                        ScrapePhase::Stalled
                    } else {
                        last_count = count;
                        self.finish_cycle(&mut scrolls, records.len()).await
                    }
                }
                ScrapePhase::Stalled => {
                    if self.driver.activate_show_more().await? {
                        // Explicit pagination control; the cycle did not
                        // actually stall.
                        sleep(self.config.scroll_settle).await;
                        self.finish_cycle(&mut scrolls, records.len()).await
                    } else {
                        ScrapePhase::Terminated(TerminationReason::NoMoreResults)
                    }
                }
                ScrapePhase::Terminated(reason) => {
                    info!(
                        session_id = %self.session_id,
                        ?reason,
                        records = records.len(),
                        scrolls,
                        "scroll/extract loop terminated"
                    );
                    return Ok(reason);
                }
            };
        }
    }

    /// Cycle bookkeeping: count the scroll, enforce the ceilings, pause
    /// before the next extraction.
    async fn finish_cycle(&self, scrolls: &mut u32, accumulated: usize) -> ScrapePhase {
        *scrolls += 1;
        if *scrolls >= self.config.max_scrolls {
            return ScrapePhase::Terminated(TerminationReason::MaxScrollsReached);
        }
        if let Some(cap) = self.config.max_results {
            if accumulated >= cap {
                return ScrapePhase::Terminated(TerminationReason::MaxResultsReached);
            }
        }
        sleep(self.config.cycle_delay).await;
        ScrapePhase::Extracting
    }
}

/// How a whole session ended, as reported to callers and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(TerminationReason),
    Cancelled,
    Failed(String),
}

/// Terminal summary of one session.
#[derive(Debug)]
pub struct SessionSummary {
    pub outcome: SessionOutcome,
    pub records: usize,
    pub filename: Option<String>,
}

/// One extraction session from accepted request to terminal cleanup.
pub struct HarvestSession {
    registry: Arc<SessionRegistry>,
    session_id: String,
    config: HarvestConfig,
    exporter: Arc<CsvExporter>,
}

impl HarvestSession {
    /// The session must already be registered under `session_id`; the HTTP
    /// layer registers before streaming so the opening frame can carry the
    /// identifier.
    pub fn new(
        registry: Arc<SessionRegistry>,
        session_id: impl Into<String>,
        config: HarvestConfig,
        exporter: Arc<CsvExporter>,
    ) -> Self {
        Self {
            registry,
            session_id: session_id.into(),
            config,
            exporter,
        }
    }

    /// Drive the session to a terminal state.
    ///
    /// Every exit path (completion, cancellation, load timeout, driver or
    /// sink failure) exports the accumulated set, attempts a final frame,
    /// releases the driver, and removes the registry entry.
    pub async fn run(
        &self,
        query: SearchQuery,
        factory: &dyn DriverFactory,
        sink: Box<dyn FrameSink>,
    ) -> SessionSummary {
        let emitter = ProgressEmitter::new(self.registry.clone(), self.session_id.clone(), sink);
        let mut records: Vec<Listing> = Vec::new();

        info!(
            session_id = %self.session_id,
            keyword = %query.keyword,
            location = query.location.as_deref().unwrap_or(""),
            "extraction session starting"
        );

        let outcome = match factory.create().await {
            Ok(driver) => {
                let result = self
                    .drive(&query, driver.as_ref(), &emitter, &mut records)
                    .await;
                if let Err(e) = driver.close().await {
                    warn!(session_id = %self.session_id, error = %e, "page driver close failed");
                }
                result
            }
            Err(e) => Err(HarvestError::Driver(e)),
        };

        let summary = self.finalize(outcome, records, &emitter).await;
        self.registry.remove(&self.session_id);
        summary
    }

    async fn drive(
        &self,
        query: &SearchQuery,
        driver: &dyn PageDriver,
        emitter: &ProgressEmitter,
        records: &mut Vec<Listing>,
    ) -> Result<TerminationReason> {
        emitter.emit(Vec::new(), "Starting search...").await?;
        load_results(driver, query, &self.config).await?;
        ScrollExtractLoop::new(driver, emitter, &self.registry, &self.session_id, &self.config)
            .run(records)
            .await
    }

    async fn finalize(
        &self,
        outcome: Result<TerminationReason>,
        records: Vec<Listing>,
        emitter: &ProgressEmitter,
    ) -> SessionSummary {
        let filename = match self.exporter.export(&records) {
            Ok(name) => Some(name),
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "export artifact failed");
                None
            }
        };
        let total = records.len();

        let (outcome, frame) = match outcome {
            Ok(TerminationReason::Cancelled) | Err(HarvestError::Cancelled) => (
                SessionOutcome::Cancelled,
                ProgressFrame::terminal(
                    records,
                    format!("Extraction stopped. Found {total} results"),
                    filename.clone(),
                ),
            ),
            Ok(reason) => (
                SessionOutcome::Completed(reason),
                ProgressFrame::terminal(
                    records,
                    format!("Completed! Found {total} results"),
                    filename.clone(),
                ),
            ),
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "extraction session failed");
                (
                    SessionOutcome::Failed(e.to_string()),
                    ProgressFrame::failed(
                        records,
                        "Error occurred during scraping",
                        e.to_string(),
                        filename.clone(),
                    ),
                )
            }
        };

        if let Err(e) = emitter.emit_terminal(frame).await {
            debug!(session_id = %self.session_id, error = %e, "terminal frame not delivered");
        }

        info!(
            session_id = %self.session_id,
            ?outcome,
            records = total,
            filename = filename.as_deref().unwrap_or(""),
            "extraction session finished"
        );

        SessionSummary {
            outcome,
            records: total,
            filename,
        }
    }
}

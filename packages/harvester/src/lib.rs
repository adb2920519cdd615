//! Map-Feed Business-Listing Extraction Library
//!
//! Drives a scrollable map-search results feed through repeated
//! extract/scroll cycles, streams incremental progress frames to a caller,
//! and finalizes every session (completed, cancelled, or failed) with a
//! tabular export artifact.
//!
//! # Design
//!
//! - The rendering engine is a capability, not a dependency: the core only
//!   consumes the [`PageDriver`] trait (read-only page queries plus scroll
//!   and navigation primitives). A chromiumoxide-backed implementation ships
//!   in [`drivers`]; tests use the scripted driver in [`testing`].
//! - Cancellation is cooperative: a polled token in the [`SessionRegistry`],
//!   checked at cycle boundaries and before each emit, never mid-extraction.
//! - Extraction is best-effort by contract: per-item anomalies drop the item,
//!   never the batch; per-session failures still export partial results.
//!
//! # Modules
//!
//! - [`engine`] - the scroll/extract state machine and session orchestration
//! - [`normalizer`] - raw item snapshot to listing
//! - [`driver`] - page-driver capability traits
//! - [`drivers`] - production driver implementations
//! - [`registry`] - in-flight session table
//! - [`emitter`] - liveness-checked progress emission
//! - [`loader`] - retry-guarded initial load
//! - [`export`] - CSV export finalizer
//! - [`selectors`] - ordered selector/prefix tables
//! - [`testing`] - scripted mocks

pub mod config;
pub mod driver;
pub mod drivers;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod export;
pub mod loader;
pub mod normalizer;
pub mod registry;
pub mod selectors;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use config::HarvestConfig;
pub use driver::{DriverError, DriverFactory, DriverResult, PageDriver};
pub use drivers::{ChromeDriver, ChromeDriverFactory};
pub use emitter::{FrameSink, ProgressEmitter, SinkClosed};
pub use engine::{
    HarvestSession, ScrollExtractLoop, SessionOutcome, SessionSummary, TerminationReason,
};
pub use error::{HarvestError, Result};
pub use export::CsvExporter;
pub use loader::{load_results, search_url};
pub use normalizer::{clean_text, derive_country_code, normalize};
pub use registry::{CancelOutcome, SessionRegistry};
pub use types::{Listing, ProgressFrame, RawItem, SearchQuery};

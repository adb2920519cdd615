//! Page-driver capability surface.
//!
//! The extraction core never touches the rendering engine directly; it
//! consumes these traits. Everything here is read-only queries against the
//! current page state plus a handful of navigation/scroll primitives, so a
//! scripted mock can stand in for a browser in tests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::RawItem;

/// Errors surfaced by a page driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("no selector in {candidates:?} became visible within {waited_ms}ms")]
    WaitTimeout {
        candidates: Vec<String>,
        waited_ms: u64,
    },

    #[error("page query failed: {0}")]
    Evaluate(String),

    #[error("browser session lost: {0}")]
    Session(String),
}

/// Result type alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// One session's handle onto the rendering engine.
///
/// A driver instance is exclusively owned by a single extraction session for
/// its whole lifetime and must be [`close`](PageDriver::close)d on every
/// exit path.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the document to settle.
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Wait until any one of `selectors` is visible, or time out.
    async fn wait_for_any(&self, selectors: &[&str], timeout: Duration) -> DriverResult<()>;

    /// Click through a consent interstitial if one is being shown.
    /// Returns true when a consent form was found and submitted.
    async fn dismiss_consent(&self) -> DriverResult<bool>;

    /// Snapshot every currently rendered result item.
    async fn collect_items(&self) -> DriverResult<Vec<RawItem>>;

    /// Count of currently rendered result items.
    async fn item_count(&self) -> DriverResult<usize>;

    /// Scroll the results pane to its current bottom and give lazy content a
    /// moment to start loading.
    async fn scroll_results_pane(&self) -> DriverResult<()>;

    /// Locate and activate a "show more" control, if the feed paginates via
    /// an explicit action. Returns true when a control was activated.
    async fn activate_show_more(&self) -> DriverResult<bool>;

    /// Drop cookies and cache so a retried load starts from a clean slate.
    async fn clear_browsing_state(&self) -> DriverResult<()>;

    /// Release the underlying browser resources. Idempotent.
    async fn close(&self) -> DriverResult<()>;
}

/// Creates one driver per extraction session.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self) -> DriverResult<Box<dyn PageDriver>>;
}

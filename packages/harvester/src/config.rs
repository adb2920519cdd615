//! Session configuration.

use std::time::Duration;

/// Configuration for one extraction session.
///
/// The original deployment ran two near-identical scrape variants (a local
/// debugging one and a hardened one); everything that differed between them
/// is a field here, so there is exactly one loop.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Load attempts before giving up with a load-timeout error.
    pub max_load_attempts: u32,
    /// Per-attempt ceiling for the initial result-container wait.
    pub load_timeout: Duration,
    /// Pause between failed load attempts.
    pub retry_backoff: Duration,
    /// Pause after a successful load, letting the first batch render.
    pub post_load_settle: Duration,
    /// Scroll-cycle budget; bounds worst-case session duration.
    pub max_scrolls: u32,
    /// Pause after each scroll for lazy content to start loading.
    pub scroll_settle: Duration,
    /// Pause between cycles.
    pub cycle_delay: Duration,
    /// Stop once this many records have been accumulated.
    pub max_results: Option<usize>,
    /// Run the browser headless.
    pub headless: bool,
    /// Block image/font subresources to cut bandwidth and memory.
    pub block_resources: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_load_attempts: 3,
            load_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(10),
            post_load_settle: Duration::from_secs(3),
            max_scrolls: 20,
            scroll_settle: Duration::from_secs(2),
            cycle_delay: Duration::from_secs(2),
            max_results: None,
            headless: true,
            block_resources: true,
        }
    }
}

impl HarvestConfig {
    /// A config with every delay zeroed, for driving the loop in tests
    /// without wall-clock waits.
    pub fn immediate() -> Self {
        Self {
            load_timeout: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            post_load_settle: Duration::ZERO,
            scroll_settle: Duration::ZERO,
            cycle_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_max_results(mut self, cap: usize) -> Self {
        self.max_results = Some(cap);
        self
    }

    pub fn with_max_scrolls(mut self, budget: u32) -> Self {
        self.max_scrolls = budget;
        self
    }
}

//! Testing utilities including mock implementations.
//!
//! Useful for exercising the extraction core without a browser or an HTTP
//! client: a scripted page driver, a factory that hands out scripted
//! drivers, and a frame sink that records everything it is sent.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{DriverError, DriverFactory, DriverResult, PageDriver};
use crate::emitter::{FrameSink, SinkClosed};
use crate::registry::SessionRegistry;
use crate::types::{ProgressFrame, RawItem};

/// Build a raw item with just a title, the minimum a listing needs.
pub fn raw_item(title: &str) -> RawItem {
    RawItem {
        title_candidates: vec![title.to_string()],
        ..RawItem::default()
    }
}

/// Build `count` titled raw items: "<prefix> 1" .. "<prefix> count".
pub fn raw_items(prefix: &str, count: usize) -> Vec<RawItem> {
    (1..=count).map(|i| raw_item(&format!("{prefix} {i}"))).collect()
}

/// Record of a call made to the mock driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Navigate(String),
    WaitForAny,
    DismissConsent,
    CollectItems,
    ItemCount,
    Scroll,
    ShowMore,
    ClearBrowsingState,
    Close,
}

#[derive(Default)]
struct DriverState {
    /// Scripted item windows. `collect_items` returns the current window;
    /// a scroll (or "show more") stages the next one, which becomes visible
    /// at the following collect. Models lazy content that starts loading on
    /// scroll and has rendered by the next cycle.
    windows: Vec<Vec<RawItem>>,
    current: usize,
    staged: usize,
    wait_failures: u32,
    consent_forms: u32,
    show_more_uses: u32,
    fail_collect_on_call: Option<u32>,
    collect_calls: u32,
    calls: Vec<DriverCall>,
    closed: bool,
}

/// A scripted page driver.
///
/// Configure with `with_*` builders, then inspect `calls()` afterwards.
/// Clones share state, so a test can keep a handle while the driver is
/// boxed into the code under test.
#[derive(Clone, Default)]
pub struct MockPageDriver {
    state: Arc<Mutex<DriverState>>,
}

impl MockPageDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the per-cycle item windows.
    pub fn with_windows(self, windows: Vec<Vec<RawItem>>) -> Self {
        self.state.lock().unwrap().windows = windows;
        self
    }

    /// Make the first `n` `wait_for_any` calls time out.
    pub fn with_wait_failures(self, n: u32) -> Self {
        self.state.lock().unwrap().wait_failures = n;
        self
    }

    /// Show a consent interstitial on the first `n` navigations.
    pub fn with_consent_forms(self, n: u32) -> Self {
        self.state.lock().unwrap().consent_forms = n;
        self
    }

    /// Provide a "show more" control for `n` activations.
    pub fn with_show_more(self, n: u32) -> Self {
        self.state.lock().unwrap().show_more_uses = n;
        self
    }

    /// Fail `collect_items` on its `call`-th invocation (1-based).
    pub fn failing_collect_on(self, call: u32) -> Self {
        self.state.lock().unwrap().fail_collect_on_call = Some(call);
        self
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn collect_count(&self) -> u32 {
        self.state.lock().unwrap().collect_calls
    }

    pub fn was_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn record(&self, call: DriverCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl PageDriver for MockPageDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.record(DriverCall::Navigate(url.to_string()));
        Ok(())
    }

    async fn wait_for_any(&self, selectors: &[&str], timeout: Duration) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::WaitForAny);
        if state.wait_failures > 0 {
            state.wait_failures -= 1;
            return Err(DriverError::WaitTimeout {
                candidates: selectors.iter().map(|s| s.to_string()).collect(),
                waited_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn dismiss_consent(&self) -> DriverResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::DismissConsent);
        if state.consent_forms > 0 {
            state.consent_forms -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    async fn collect_items(&self) -> DriverResult<Vec<RawItem>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::CollectItems);
        state.collect_calls += 1;
        if state.fail_collect_on_call == Some(state.collect_calls) {
            return Err(DriverError::Evaluate("injected collect failure".into()));
        }
        state.current = state.staged;
        Ok(state.windows.get(state.current).cloned().unwrap_or_default())
    }

    async fn item_count(&self) -> DriverResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::ItemCount);
        Ok(state
            .windows
            .get(state.current)
            .map(Vec::len)
            .unwrap_or_default())
    }

    async fn scroll_results_pane(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::Scroll);
        if !state.windows.is_empty() {
            state.staged = (state.current + 1).min(state.windows.len() - 1);
        }
        Ok(())
    }

    async fn activate_show_more(&self) -> DriverResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::ShowMore);
        if state.show_more_uses == 0 {
            return Ok(false);
        }
        state.show_more_uses -= 1;
        if !state.windows.is_empty() {
            state.staged = (state.current + 1).min(state.windows.len() - 1);
        }
        Ok(true)
    }

    async fn clear_browsing_state(&self) -> DriverResult<()> {
        self.record(DriverCall::ClearBrowsingState);
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::Close);
        state.closed = true;
        Ok(())
    }
}

#[derive(Default)]
struct FactoryState {
    drivers: VecDeque<MockPageDriver>,
    created: u32,
    fail: bool,
}

/// Hands out scripted drivers, one per session.
#[derive(Clone, Default)]
pub struct MockDriverFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockDriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a driver; sessions receive them in order. When the queue runs
    /// dry, an unscripted driver is handed out instead.
    pub fn with_driver(self, driver: MockPageDriver) -> Self {
        self.state.lock().unwrap().drivers.push_back(driver);
        self
    }

    /// Make every `create` call fail.
    pub fn failing(self) -> Self {
        self.state.lock().unwrap().fail = true;
        self
    }

    pub fn created(&self) -> u32 {
        self.state.lock().unwrap().created
    }
}

#[async_trait]
impl DriverFactory for MockDriverFactory {
    async fn create(&self) -> DriverResult<Box<dyn PageDriver>> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(DriverError::Session(
                "mock factory configured to fail".into(),
            ));
        }
        state.created += 1;
        let driver = state.drivers.pop_front().unwrap_or_default();
        Ok(Box::new(driver))
    }
}

#[derive(Default)]
struct SinkState {
    frames: Vec<ProgressFrame>,
    closed: bool,
    cancel_after: Option<(usize, Arc<SessionRegistry>, String)>,
}

/// A frame sink that records every frame it is sent.
#[derive(Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave like a disconnected client: every send fails.
    pub fn closed(self) -> Self {
        self.state.lock().unwrap().closed = true;
        self
    }

    /// Stop `session_id` through `registry` once `n` frames have been
    /// recorded, simulating a stop request racing the stream.
    pub fn cancel_session_after(
        self,
        n: usize,
        registry: Arc<SessionRegistry>,
        session_id: impl Into<String>,
    ) -> Self {
        self.state.lock().unwrap().cancel_after = Some((n, registry, session_id.into()));
        self
    }

    pub fn frames(&self) -> Vec<ProgressFrame> {
        self.state.lock().unwrap().frames.clone()
    }
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send(&self, frame: ProgressFrame) -> Result<(), SinkClosed> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(SinkClosed);
        }
        state.frames.push(frame);
        if let Some((n, registry, session_id)) = state.cancel_after.clone() {
            if state.frames.len() >= n {
                registry.cancel(&session_id);
            }
        }
        Ok(())
    }
}

//! Headless-Chrome page driver via chromiumoxide.
//!
//! All DOM work happens inside the page through read-only evaluate calls;
//! the scripts below are the only place selector tables meet a real
//! document. Scripts are synchronous IIFEs returning JSON-shaped values, so
//! the camelCase field names line up with [`RawItem`]'s wire form.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCacheParams, ClearBrowserCookiesParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::HarvestConfig;
use crate::driver::{DriverError, DriverFactory, DriverResult, PageDriver};
use crate::selectors::{
    ADDRESS_SELECTOR, CATEGORY_SELECTORS, FEED_CONTAINER_SELECTORS, ITEM_SELECTOR, PHONE_SELECTOR,
    RATING_SELECTOR, REVIEWS_SELECTOR, TITLE_SELECTORS, WEBSITE_SELECTOR,
};
use crate::types::RawItem;

/// Desktop UA; the feed serves a different, harder-to-scrape layout to
/// unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const VISIBILITY_POLL: Duration = Duration::from_millis(250);
const SCROLL_PAUSE: Duration = Duration::from_millis(500);

fn session_err(e: impl ToString) -> DriverError {
    DriverError::Session(e.to_string())
}

fn eval_err(e: impl ToString) -> DriverError {
    DriverError::Evaluate(e.to_string())
}

/// One browser instance bound to one extraction session.
pub struct ChromeDriver {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeDriver {
    /// Launch a browser and open the session's page.
    pub async fn launch(headless: bool, block_resources: bool) -> DriverResult<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-blink-features=AutomationControlled");
        if !headless {
            builder = builder.with_head();
        }
        if block_resources {
            builder = builder
                .arg("--blink-settings=imagesEnabled=false")
                .arg("--disable-remote-fonts");
        }
        let config = builder.build().map_err(DriverError::Session)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(session_err)?;
        // The CDP event handler must be polled for the connection to make
        // progress; it lives for as long as the browser does.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(session_err)?;
        page.set_user_agent(USER_AGENT).await.map_err(session_err)?;

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> DriverResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(eval_err)?
            .into_value()
            .map_err(eval_err)
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_any(&self, selectors: &[&str], timeout: Duration) -> DriverResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            for selector in selectors {
                if self.eval::<bool>(visibility_script(selector)).await? {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::WaitTimeout {
                    candidates: selectors.iter().map(|s| s.to_string()).collect(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            sleep(VISIBILITY_POLL).await;
        }
    }

    async fn dismiss_consent(&self) -> DriverResult<bool> {
        let clicked: bool = self.eval(consent_script()).await?;
        if clicked {
            // Submitting the form redirects back to the results.
            if let Err(e) = self.page.wait_for_navigation().await {
                debug!(error = %e, "no navigation after consent submit");
            }
        }
        Ok(clicked)
    }

    async fn collect_items(&self) -> DriverResult<Vec<RawItem>> {
        self.eval(collect_items_script()).await
    }

    async fn item_count(&self) -> DriverResult<usize> {
        self.eval(item_count_script()).await
    }

    async fn scroll_results_pane(&self) -> DriverResult<()> {
        let scrolled: bool = self.eval(scroll_script()).await?;
        if !scrolled {
            debug!("no results pane matched the container selectors");
        }
        sleep(SCROLL_PAUSE).await;
        Ok(())
    }

    async fn activate_show_more(&self) -> DriverResult<bool> {
        self.eval(show_more_script()).await
    }

    async fn clear_browsing_state(&self) -> DriverResult<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(session_err)?;
        self.page
            .execute(ClearBrowserCacheParams::default())
            .await
            .map_err(session_err)?;
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "browser close failed");
            }
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "browser process wait failed");
            }
            self.handler_task.abort();
        }
        Ok(())
    }
}

/// Launches one [`ChromeDriver`] per session.
pub struct ChromeDriverFactory {
    headless: bool,
    block_resources: bool,
}

impl ChromeDriverFactory {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            headless: config.headless,
            block_resources: config.block_resources,
        }
    }
}

#[async_trait]
impl DriverFactory for ChromeDriverFactory {
    async fn create(&self) -> DriverResult<Box<dyn PageDriver>> {
        let driver = ChromeDriver::launch(self.headless, self.block_resources).await?;
        Ok(Box::new(driver))
    }
}

// ---------------------------------------------------------------------------
// In-page scripts
// ---------------------------------------------------------------------------

/// Embed a Rust string as a JS string literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Embed a selector list as a JS array literal.
fn js_string_array(items: &[&str]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn visibility_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return false;
  const rect = el.getBoundingClientRect();
  return rect.width > 0 && rect.height > 0;
}})()"#,
        sel = js_string(selector)
    )
}

fn consent_script() -> String {
    r#"(() => {
  const form = document.querySelector('form[action*="consent"]');
  if (!form) return false;
  const button = form.querySelector('button[type="submit"]');
  if (!button) return false;
  button.click();
  return true;
})()"#
        .to_string()
}

fn item_count_script() -> String {
    format!(
        "document.querySelectorAll({}).length",
        js_string(ITEM_SELECTOR)
    )
}

fn scroll_script() -> String {
    format!(
        r#"(() => {{
  let pane = null;
  for (const selector of {containers}) {{
    pane = document.querySelector(selector);
    if (pane) break;
  }}
  if (!pane) return false;
  pane.scrollTo(0, pane.scrollHeight);
  return true;
}})()"#,
        containers = js_string_array(FEED_CONTAINER_SELECTORS)
    )
}

fn show_more_script() -> String {
    r#"(() => {
  const button = Array.from(document.querySelectorAll('button'))
    .find((b) => b.textContent.includes('Show more'));
  if (!button) return false;
  button.click();
  return true;
})()"#
        .to_string()
}

fn collect_items_script() -> String {
    format!(
        r#"(() => {{
  const items = document.querySelectorAll({item});
  const text = (root, selector) => {{
    const el = root.querySelector(selector);
    return el && el.textContent ? el.textContent : null;
  }};
  return Array.from(items).map((item) => {{
    const titleCandidates = [];
    for (const selector of {titles}) {{
      const el = item.querySelector(selector);
      if (el && el.textContent) titleCandidates.push(el.textContent);
    }}
    const categoryCandidates = [];
    for (const selector of {categories}) {{
      for (const el of item.querySelectorAll(selector)) {{
        if (el.textContent) categoryCandidates.push(el.textContent);
      }}
    }}
    const websiteLink = item.querySelector({website});
    return {{
      titleCandidates,
      rating: text(item, {rating}),
      reviews: text(item, {reviews}),
      website: websiteLink ? websiteLink.href : null,
      address: text(item, {address}),
      phone: text(item, {phone}),
      categoryCandidates,
      textFragments: Array.from(item.querySelectorAll('span')).map((s) => s.textContent || ''),
    }};
  }});
}})()"#,
        item = js_string(ITEM_SELECTOR),
        titles = js_string_array(TITLE_SELECTORS),
        categories = js_string_array(CATEGORY_SELECTORS),
        website = js_string(WEBSITE_SELECTOR),
        rating = js_string(RATING_SELECTOR),
        reviews = js_string(REVIEWS_SELECTOR),
        address = js_string(ADDRESS_SELECTOR),
        phone = js_string(PHONE_SELECTOR),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_embed_the_selector_tables() {
        let collect = collect_items_script();
        assert!(collect.contains("titleCandidates"));
        assert!(collect.contains("textFragments"));
        assert!(collect.contains("div.qBF1Pd"));
        assert!(collect.contains("span.Usd1K"));

        let scroll = scroll_script();
        assert!(scroll.contains("div[role=\\\"feed\\\"]"));

        let count = item_count_script();
        assert!(count.contains("querySelectorAll"));
    }

    #[test]
    fn js_string_escapes_quotes() {
        let quoted = js_string("a[href^=\"http\"]");
        assert_eq!(quoted, "\"a[href^=\\\"http\\\"]\"");
    }

    #[test]
    fn collected_item_json_round_trips_into_raw_item() {
        // The object literal shape produced by the collect script.
        let payload = r#"{
            "titleCandidates": ["Cafe Luna"],
            "rating": "4.5",
            "reviews": "(120)",
            "website": "https://cafeluna.example",
            "address": "12 Main St",
            "phone": null,
            "categoryCandidates": ["Coffee shop"],
            "textFragments": ["4.5", "(120)", "Coffee shop"]
        }"#;
        let item: RawItem = serde_json::from_str(payload).unwrap();
        assert_eq!(item.title_candidates, vec!["Cafe Luna"]);
        assert_eq!(item.category_candidates, vec!["Coffee shop"]);
        assert!(item.phone.is_none());
    }
}

//! Retry-guarded initial load.
//!
//! Gets the page driver from a cold start to "results are visible", or fails
//! the session with a load-timeout error carrying the attempt count and the
//! last underlying failure. Success is silent; no frames are emitted here.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::HarvestConfig;
use crate::driver::{DriverResult, PageDriver};
use crate::error::{HarvestError, Result};
use crate::selectors::RESULT_SELECTORS;
use crate::types::SearchQuery;

/// The query-encoded search URL for a request.
pub fn search_url(query: &SearchQuery) -> String {
    format!(
        "https://www.google.com/maps/search/{}",
        urlencoding::encode(&query.phrase())
    )
}

/// Navigate to the search results and wait for a result container.
///
/// Each attempt starts from a clean slate (cookies and cache dropped) so a
/// stale-session artifact from a failed attempt cannot poison the retry.
pub async fn load_results(
    driver: &dyn PageDriver,
    query: &SearchQuery,
    config: &HarvestConfig,
) -> Result<()> {
    let url = search_url(query);
    let mut last_error = String::new();

    for attempt in 1..=config.max_load_attempts {
        match attempt_load(driver, &url, config).await {
            Ok(()) => {
                info!(attempt, url = %url, "search results visible");
                // Let the first batch of results finish rendering.
                sleep(config.post_load_settle).await;
                return Ok(());
            }
            Err(e) => {
                warn!(attempt, error = %e, "initial load attempt failed");
                last_error = e.to_string();
                if attempt < config.max_load_attempts {
                    sleep(config.retry_backoff).await;
                }
            }
        }
    }

    Err(HarvestError::LoadTimeout {
        attempts: config.max_load_attempts,
        last_error,
    })
}

async fn attempt_load(
    driver: &dyn PageDriver,
    url: &str,
    config: &HarvestConfig,
) -> DriverResult<()> {
    driver.clear_browsing_state().await?;
    driver.navigate(url).await?;
    if driver.dismiss_consent().await? {
        info!("consent interstitial dismissed");
    }
    driver
        .wait_for_any(RESULT_SELECTORS, config.load_timeout)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DriverCall, MockPageDriver};

    #[test]
    fn search_url_is_query_encoded() {
        let query = SearchQuery::new("coffee shops", Some("São Paulo".to_string()));
        let url = search_url(&query);
        assert_eq!(
            url,
            "https://www.google.com/maps/search/coffee%20shops%20in%20S%C3%A3o%20Paulo"
        );
    }

    #[tokio::test]
    async fn load_succeeds_after_transient_failures() {
        let driver = MockPageDriver::new().with_wait_failures(2);
        let config = HarvestConfig::immediate();
        let query = SearchQuery::new("coffee", None);

        load_results(&driver, &query, &config).await.unwrap();

        // Every attempt starts clean: three clears, three navigations.
        let calls = driver.calls();
        let clears = calls
            .iter()
            .filter(|c| matches!(c, DriverCall::ClearBrowsingState))
            .count();
        let navigations = calls
            .iter()
            .filter(|c| matches!(c, DriverCall::Navigate(_)))
            .count();
        assert_eq!(clears, 3);
        assert_eq!(navigations, 3);
    }

    #[tokio::test]
    async fn consent_interstitial_does_not_derail_the_load() {
        let driver = MockPageDriver::new().with_consent_forms(1);
        let config = HarvestConfig::immediate();
        let query = SearchQuery::new("coffee", None);

        load_results(&driver, &query, &config).await.unwrap();

        let calls = driver.calls();
        assert!(calls.contains(&DriverCall::DismissConsent));
        assert!(calls.contains(&DriverCall::WaitForAny));
    }

    #[tokio::test]
    async fn exhausted_attempts_fail_with_load_timeout() {
        let driver = MockPageDriver::new().with_wait_failures(10);
        let config = HarvestConfig::immediate();
        let query = SearchQuery::new("coffee", None);

        let err = load_results(&driver, &query, &config).await.unwrap_err();
        match err {
            HarvestError::LoadTimeout {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(!last_error.is_empty());
            }
            other => panic!("expected LoadTimeout, got {other:?}"),
        }
    }
}

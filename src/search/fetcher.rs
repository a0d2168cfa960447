//! The production [`ListingFetcher`]: renders the marketplace results page
//! and extracts ad records from it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::page::Page;
use tracing::{debug, info};
use url::Url;

use crate::config::CONFIG;

use super::browser::BrowserSession;
use super::extract::{extract_records, CARD_SELECTOR};
use super::query::{build_search_url, SearchQuery};
use super::{AdRecord, FetchError, ListingFetcher};

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Outcome of the bounded wait for listing cards.
enum Readiness {
    Ready,
    TimedOutEmpty,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OlxFetcher;

impl OlxFetcher {
    pub fn new() -> Self {
        OlxFetcher
    }
}

#[async_trait]
impl ListingFetcher for OlxFetcher {
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<AdRecord>, FetchError> {
        let url = build_search_url(&CONFIG.olx_base_url, query)?;
        info!("Fetching listings from {url}");

        let session = BrowserSession::launch().await?;
        // The session is closed before the result is inspected so release
        // happens on every exit path, including extraction failures.
        let result = run_search(&session, &url).await;
        session.close().await;
        result
    }
}

async fn run_search(session: &BrowserSession, url: &Url) -> Result<Vec<AdRecord>, FetchError> {
    let page = session
        .browser()
        .new_page(url.as_str())
        .await
        .map_err(|source| FetchError::Navigation {
            url: url.to_string(),
            source,
        })?;

    if let Err(source) = page.wait_for_navigation().await {
        return Err(FetchError::Navigation {
            url: url.to_string(),
            source,
        });
    }

    match wait_for_cards(&page).await? {
        Readiness::Ready => {}
        Readiness::TimedOutEmpty => {
            debug!("No listing cards rendered within the readiness window");
            return Ok(Vec::new());
        }
    }

    let html = page.content().await.map_err(FetchError::Browser)?;
    let records = extract_records(&html, url);
    info!("Extracted {} ad record(s)", records.len());
    Ok(records)
}

/// Poll for the first listing card instead of sleeping a fixed delay.
///
/// A timeout with zero cards means "no results", not a failure; a page that
/// stops answering altogether does surface as one.
async fn wait_for_cards(page: &Page) -> Result<Readiness, FetchError> {
    let deadline = Duration::from_secs(CONFIG.results_wait_timeout_seconds);
    let start = Instant::now();

    loop {
        if page.find_element(CARD_SELECTOR).await.is_ok() {
            debug!(
                "Listing cards appeared after {:.2}s",
                start.elapsed().as_secs_f64()
            );
            return Ok(Readiness::Ready);
        }

        if start.elapsed() >= deadline {
            // Distinguish an empty results page from a dead session.
            if let Err(err) = page.url().await {
                return Err(FetchError::Browser(err));
            }
            return Ok(Readiness::TimedOutEmpty);
        }

        tokio::time::sleep(READINESS_POLL_INTERVAL).await;
    }
}

//! Listing search against the marketplace: URL construction, a one-shot
//! browser session, and best-effort card extraction.

pub mod browser;
pub mod extract;
pub mod fetcher;
pub mod query;

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fetcher::OlxFetcher;
pub use query::{SearchQuery, SortOrder};

/// One scraped listing. Built once per search, sent to the chat, discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRecord {
    pub title: String,
    pub price: String,
    /// Absolute URL of the listing. Cards with no derivable link are never
    /// turned into records.
    pub link: String,
    /// Absolute thumbnail URL, when the card has one.
    pub image: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid marketplace base URL '{base}': {source}")]
    BadBaseUrl {
        base: String,
        #[source]
        source: url::ParseError,
    },
    #[error("marketplace base URL '{0}' cannot carry path segments")]
    BaseNotExtensible(String),
    #[error("invalid browser configuration: {0}")]
    BrowserConfig(String),
    #[error("failed to launch browser: {0}")]
    Launch(#[source] CdpError),
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: CdpError,
    },
    #[error("browser session failed: {0}")]
    Browser(#[source] CdpError),
}

/// Produces a bounded, ordered list of ad records for a resolved query.
///
/// No retry happens behind this trait; a failed fetch surfaces as a single
/// [`FetchError`] and re-triggering is up to the user.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<AdRecord>, FetchError>;
}

use std::sync::Arc;

use crate::search::{ListingFetcher, OlxFetcher};
use crate::sessions::store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub fetcher: Arc<dyn ListingFetcher>,
}

impl AppState {
    pub fn new() -> Self {
        AppState::with_fetcher(Arc::new(OlxFetcher::new()))
    }

    pub fn with_fetcher(fetcher: Arc<dyn ListingFetcher>) -> Self {
        AppState {
            sessions: SessionStore::new(),
            fetcher,
        }
    }
}

//! One-shot Chromium session owned by a single search invocation.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::CONFIG;

use super::FetchError;

/// A dedicated browser instance plus its CDP event handler task.
///
/// [`close`](BrowserSession::close) must run on every fetch exit path; the
/// `Drop` impl only aborts the handler task as a backstop.
pub struct BrowserSession {
    browser: Browser,
    handler: Option<JoinHandle<()>>,
}

impl BrowserSession {
    pub async fn launch() -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(CONFIG.page_nav_timeout_seconds))
            .window_size(1280, 1024)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        builder = if CONFIG.browser_headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        if let Some(path) = &CONFIG.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(FetchError::BrowserConfig)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(FetchError::Launch)?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    let message = err.to_string();
                    // Chrome emits CDP events chromiumoxide cannot
                    // deserialize; those are noise on this code path.
                    if message.contains("data did not match any variant of untagged enum Message")
                    {
                        debug!("Ignoring unrecognized CDP event: {message}");
                    } else {
                        warn!("Browser handler error: {message}");
                    }
                }
            }
            debug!("Browser handler task finished");
        });

        Ok(BrowserSession {
            browser,
            handler: Some(handler_task),
        })
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Shut the browser down and reap the Chromium process.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!("Failed to close browser: {err}");
        }
        if let Err(err) = self.browser.wait().await {
            warn!("Failed to reap browser process: {err}");
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

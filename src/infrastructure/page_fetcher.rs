//! Page fetching seam
//!
//! The pipeline only needs a handful of browser-like capabilities: open a
//! page, navigate it, wait (bounded) for markup, read the current document,
//! close it. Concrete backends implement [`PageFetcher`] and [`BrowserPage`];
//! structured extraction happens on the returned source through
//! [`Document`](crate::infrastructure::parsing::Document).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("HTTP request failed with status {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No document loaded; navigate first")]
    NoDocument,

    #[error("Page is closed")]
    Closed,

    #[error("Failed to set up page fetcher: {0}")]
    Setup(String),
}

impl FetchError {
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// One open page/tab.
///
/// Callers must [`close`](BrowserPage::close) a page on every exit path once
/// they are done with it.
#[async_trait]
pub trait BrowserPage: Send {
    /// Load `url`, replacing the current document
    async fn navigate(&mut self, url: &str) -> FetchResult<()>;

    /// Wait up to `timeout` for `selector` to match in the current document.
    ///
    /// `Ok(false)` means the deadline passed without a match.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> FetchResult<bool>;

    /// URL of the current document after redirects
    fn url(&self) -> Option<&str>;

    /// HTML source of the current document
    fn content(&self) -> FetchResult<&str>;

    /// Release the page. Further calls fail with [`FetchError::Closed`].
    async fn close(&mut self) -> FetchResult<()>;
}

/// Source of pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn open_page(&self) -> FetchResult<Box<dyn BrowserPage>>;
}

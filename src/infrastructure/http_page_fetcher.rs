//! HTTP-backed page fetcher with rate limiting
//!
//! Serves server-rendered pages with plain GET requests. A "page" keeps the
//! last fetched document; waiting for a selector re-fetches the same URL on a
//! fixed interval until the selector matches or the deadline passes.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use tokio::time::{Instant, sleep};
use tracing::debug;

use super::config::HttpConfig;
use super::page_fetcher::{BrowserPage, FetchError, FetchResult, PageFetcher};
use super::parsing::{compile_selector, document::source_contains};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Opens [`HttpPage`]s sharing one client and one rate limiter
pub struct HttpPageFetcher {
    client: Client,
    rate_limiter: Arc<DirectRateLimiter>,
    poll_interval: Duration,
}

impl HttpPageFetcher {
    pub fn new(config: &HttpConfig, poll_interval: Duration) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FetchError::Setup(format!("Invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| FetchError::Setup(format!("Failed to create HTTP client: {e}")))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .ok_or_else(|| FetchError::Setup("Rate limit must be greater than 0".to_string()))?,
        );

        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            poll_interval,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn open_page(&self) -> FetchResult<Box<dyn BrowserPage>> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
            poll_interval: self.poll_interval,
            current_url: None,
            body: None,
            closed: false,
        }))
    }
}

pub struct HttpPage {
    client: Client,
    rate_limiter: Arc<DirectRateLimiter>,
    poll_interval: Duration,
    current_url: Option<String>,
    body: Option<String>,
    closed: bool,
}

impl HttpPage {
    fn ensure_open(&self) -> FetchResult<()> {
        if self.closed {
            Err(FetchError::Closed)
        } else {
            Ok(())
        }
    }

    async fn fetch(&mut self, url: &str) -> FetchResult<()> {
        self.rate_limiter.until_ready().await;

        debug!("Fetching URL: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::navigation(url, format!("failed to read body: {e}")))?;

        debug!("Fetched {} ({} chars)", final_url, body.len());
        self.current_url = Some(final_url);
        self.body = Some(body);
        Ok(())
    }
}

/// Time to sleep before the next reload, or `None` once `deadline` has passed.
///
/// The last sleep is shortened so the final check lands on the deadline.
fn next_poll_delay(now: Instant, deadline: Instant, poll_interval: Duration) -> Option<Duration> {
    let remaining = deadline.checked_duration_since(now).filter(|d| !d.is_zero())?;
    Some(remaining.min(poll_interval))
}

#[async_trait]
impl BrowserPage for HttpPage {
    async fn navigate(&mut self, url: &str) -> FetchResult<()> {
        self.ensure_open()?;
        self.fetch(url).await
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> FetchResult<bool> {
        self.ensure_open()?;
        let compiled = compile_selector(selector).map_err(|e| FetchError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        let url = self.current_url.clone().ok_or(FetchError::NoDocument)?;
        let deadline = Instant::now() + timeout;

        loop {
            if self.body.as_deref().is_some_and(|body| source_contains(body, &compiled)) {
                return Ok(true);
            }
            let Some(delay) = next_poll_delay(Instant::now(), deadline, self.poll_interval) else {
                return Ok(false);
            };
            sleep(delay).await;
            self.fetch(&url).await?;
        }
    }

    fn url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    fn content(&self) -> FetchResult<&str> {
        self.ensure_open()?;
        self.body.as_deref().ok_or(FetchError::NoDocument)
    }

    async fn close(&mut self) -> FetchResult<()> {
        if !self.closed {
            self.closed = true;
            self.body = None;
            debug!("Closed page {}", self.current_url.as_deref().unwrap_or("about:blank"));
        }
        Ok(())
    }
}

//! Test utilities for release-harvest
//!
//! Provides an in-memory [`PageFetcher`] serving canned HTML, plus builders
//! for the three page kinds, so pipeline tests never touch the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::page_fetcher::{BrowserPage, FetchError, FetchResult, PageFetcher};
use crate::infrastructure::parsing::compile_selector;
use crate::infrastructure::parsing::document::source_contains;

#[derive(Default)]
struct SiteState {
    pages: Mutex<HashMap<String, String>>,
    navigations: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Serves a fixed URL -> HTML map.
///
/// Clones share the same pages and counters, so a test can keep a handle
/// while the orchestrator owns another and edit the site between runs.
#[derive(Clone, Default)]
pub struct StaticPageFetcher {
    state: Arc<SiteState>,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.set_page(url, html);
        self
    }

    /// Landing page listing `(title, release index url)` cards
    pub fn with_landing(self, url: &str, products: &[(&str, &str)]) -> Self {
        self.with_page(url, landing_html(products))
    }

    /// Release index page with `(version, date, changelog url)` rows
    pub fn with_release_table(self, url: &str, rows: &[(&str, &str, Option<&str>)]) -> Self {
        self.with_page(url, release_table_html(rows))
    }

    pub fn with_changelog(self, url: &str, title: &str, entries: &[&str]) -> Self {
        self.with_page(url, changelog_html(title, entries))
    }

    pub fn set_page(&self, url: &str, html: impl Into<String>) {
        self.pages().insert(url.to_string(), html.into());
    }

    pub fn remove_page(&self, url: &str) {
        self.pages().remove(url);
    }

    pub fn opened_pages(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed_pages(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Every URL navigated to, in order, across all pages
    pub fn navigations(&self) -> Vec<String> {
        self.state
            .navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Configuration with waits short enough for tests
    pub fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.timing.discovery_timeout_ms = 20;
        config.timing.release_table_timeout_ms = 20;
        config.timing.poll_interval_ms = 5;
        config
    }

    fn pages(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.state.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn open_page(&self) -> FetchResult<Box<dyn BrowserPage>> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticPage {
            site: Arc::clone(&self.state),
            current_url: None,
            body: None,
            closed: false,
        }))
    }
}

/// Page over a [`StaticPageFetcher`]'s map. Unknown URLs answer 404.
pub struct StaticPage {
    site: Arc<SiteState>,
    current_url: Option<String>,
    body: Option<String>,
    closed: bool,
}

#[async_trait]
impl BrowserPage for StaticPage {
    async fn navigate(&mut self, url: &str) -> FetchResult<()> {
        if self.closed {
            return Err(FetchError::Closed);
        }
        self.site
            .navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let body = self
            .site
            .pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned();
        self.current_url = Some(url.to_string());
        self.body = body;

        if self.body.is_none() {
            return Err(FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            });
        }
        Ok(())
    }

    /// Static markup never changes, so there is nothing to wait for
    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> FetchResult<bool> {
        if self.closed {
            return Err(FetchError::Closed);
        }
        let compiled = compile_selector(selector).map_err(|e| FetchError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        let body = self.body.as_deref().ok_or(FetchError::NoDocument)?;
        Ok(source_contains(body, &compiled))
    }

    fn url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    fn content(&self) -> FetchResult<&str> {
        if self.closed {
            return Err(FetchError::Closed);
        }
        self.body.as_deref().ok_or(FetchError::NoDocument)
    }

    async fn close(&mut self) -> FetchResult<()> {
        if !self.closed {
            self.closed = true;
            self.site.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub fn landing_html(products: &[(&str, &str)]) -> String {
    let cards: String = products
        .iter()
        .map(|(title, href)| {
            format!(
                r#"<div class="release-dir-items-wrap model">
                     <h3 class="model-title">{title}</h3>
                     <div class="release-dir-item-link"><a href="{href}">View releases</a></div>
                   </div>"#
            )
        })
        .collect();
    format!("<html><body><div class=\"release-dir\">{cards}</div></body></html>")
}

pub fn release_table_html(rows: &[(&str, &str, Option<&str>)]) -> String {
    let body: String = rows
        .iter()
        .map(|(version, date, changelog)| {
            let link = changelog.map_or_else(
                || "<td>-</td>".to_string(),
                |href| format!(r#"<td><a href="{href}">Changelog</a></td>"#),
            );
            format!("<tr><td>{version}</td><td>{date}</td>{link}</tr>")
        })
        .collect();
    format!(
        r#"<html><body><table class="bb-cli-table">
             <thead><tr><th>Version</th><th>Date</th><th></th></tr></thead>
             <tbody>{body}</tbody>
           </table></body></html>"#
    )
}

pub fn changelog_html(title: &str, entries: &[&str]) -> String {
    let items: String = entries.iter().map(|entry| format!("<li>{entry}</li>")).collect();
    format!(
        r#"<html><body><h1 class="entry-title">{title}</h1>
             <div class="entry-reference"><ul>{items}</ul><ul><li>Not this list</li></ul></div>
           </body></html>"#
    )
}

use std::sync::Arc;

use tracing::{debug, warn};

use super::HarvestError;
use crate::domain::ChangelogFragment;
use crate::infrastructure::page_fetcher::{BrowserPage, PageFetcher};
use crate::infrastructure::parsing::{ChangelogParser, PageParser, SelectorConfig};

/// Pulls title and change entries from one changelog page.
///
/// Every extraction runs in its own page, opened right before use and closed
/// on every exit path.
pub struct ChangelogExtractor {
    fetcher: Arc<dyn PageFetcher>,
    parser: ChangelogParser,
}

impl ChangelogExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, selectors: &SelectorConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            fetcher,
            parser: ChangelogParser::new(selectors)?,
        })
    }

    /// Any failure comes back as [`HarvestError::ExtractionError`] for `url`.
    pub async fn extract(&self, url: &str) -> Result<ChangelogFragment, HarvestError> {
        let mut page = self
            .fetcher
            .open_page()
            .await
            .map_err(|e| HarvestError::extraction(url, e))?;

        let result = self.extract_on(page.as_mut(), url).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close changelog page {}: {}", url, e);
        }
        result
    }

    async fn extract_on(&self, page: &mut dyn BrowserPage, url: &str) -> Result<ChangelogFragment, HarvestError> {
        page.navigate(url)
            .await
            .map_err(|e| HarvestError::extraction(url, e))?;

        let source = page.content().map_err(|e| HarvestError::extraction(url, e))?;
        let fragment = self
            .parser
            .parse_source(source, page.url())
            .map_err(|e| HarvestError::extraction(url, e))?;

        debug!("{} entries on {}", fragment.entries.len(), url);
        Ok(fragment)
    }
}

use std::time::Duration;

use tracing::{debug, info};

use super::HarvestError;
use crate::domain::{Product, ReleaseRow};
use crate::infrastructure::page_fetcher::BrowserPage;
use crate::infrastructure::parsing::{PageParser, ReleaseTableParser, SelectorConfig};

/// Scrapable rows of one product's release table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseIndex {
    /// Rows carrying a changelog URL, in table order
    pub rows: Vec<ReleaseRow>,
    /// Rows dropped for lacking a "Changelog" anchor
    pub without_changelog: usize,
}

/// Reads version/date/changelog rows from a product's release index page
pub struct ReleaseIndexScanner {
    parser: ReleaseTableParser,
    row_selector: String,
    timeout: Duration,
}

impl ReleaseIndexScanner {
    pub fn new(selectors: &SelectorConfig, timeout: Duration) -> Result<Self, HarvestError> {
        Ok(Self {
            parser: ReleaseTableParser::new(selectors)?,
            row_selector: selectors.release_row.clone(),
            timeout,
        })
    }

    /// Scan `product`'s release index.
    ///
    /// A table that never appears yields [`HarvestError::ProductScanTimeout`];
    /// callers treat it, like a navigation error, as "skip this product".
    pub async fn scan(
        &self,
        page: &mut dyn BrowserPage,
        product: &Product,
    ) -> Result<ReleaseIndex, HarvestError> {
        page.navigate(&product.release_index_url).await?;

        if !page.wait_for_selector(&self.row_selector, self.timeout).await? {
            return Err(HarvestError::ProductScanTimeout {
                product: product.title.clone(),
                url: product.release_index_url.clone(),
                timeout: self.timeout,
            });
        }

        let rows = self.parser.parse_source(page.content()?, page.url())?;
        debug!("{} release rows for {}", rows.len(), product.title);

        let mut index = ReleaseIndex::default();
        for row in rows {
            if row.changelog_url.is_some() {
                index.rows.push(row);
            } else {
                let skipped = HarvestError::NoChangelogLink {
                    product: product.title.clone(),
                    version: row.version,
                };
                info!("❌ {}", skipped);
                index.without_changelog += 1;
            }
        }
        Ok(index)
    }
}

use std::time::Duration;

use tracing::info;

use super::HarvestError;
use crate::domain::Product;
use crate::infrastructure::page_fetcher::BrowserPage;
use crate::infrastructure::parsing::{PageParser, ProductListParser, SelectorConfig};

/// Enumerates products and their release index URLs from the landing page
pub struct ProductDiscoverer {
    parser: ProductListParser,
    item_selector: String,
    timeout: Duration,
}

impl ProductDiscoverer {
    pub fn new(selectors: &SelectorConfig, timeout: Duration) -> Result<Self, HarvestError> {
        Ok(Self {
            parser: ProductListParser::new(selectors)?,
            item_selector: selectors.product_item.clone(),
            timeout,
        })
    }

    /// Navigate `page` to the landing page and read the product cards.
    ///
    /// Fails with [`HarvestError::DiscoveryTimeout`] when the listing markup
    /// never appears.
    pub async fn discover(
        &self,
        page: &mut dyn BrowserPage,
        landing_url: &str,
    ) -> Result<Vec<Product>, HarvestError> {
        page.navigate(landing_url).await?;

        if !page.wait_for_selector(&self.item_selector, self.timeout).await? {
            return Err(HarvestError::DiscoveryTimeout {
                url: landing_url.to_string(),
                timeout: self.timeout,
            });
        }

        let products = self.parser.parse_source(page.content()?, page.url())?;
        info!("🔗 Found {} products", products.len());
        Ok(products)
    }
}

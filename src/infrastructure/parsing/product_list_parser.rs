//! Landing page parser: product cards to `Product` values

use scraper::Selector;
use tracing::debug;

use super::{Document, PageParser, ParsingResult, SelectorConfig, compile_selector, inner_text};
use crate::domain::Product;

/// Extracts `{title, release index URL}` pairs from the landing page
pub struct ProductListParser {
    item: Selector,
    title: Selector,
    link: Selector,
}

impl ProductListParser {
    pub fn new(selectors: &SelectorConfig) -> ParsingResult<Self> {
        Ok(Self {
            item: compile_selector(&selectors.product_item)?,
            title: compile_selector(&selectors.product_title)?,
            link: compile_selector(&selectors.product_link)?,
        })
    }
}

impl PageParser for ProductListParser {
    type Output = Vec<Product>;

    /// Cards missing a non-empty title or a usable link are dropped; page
    /// order is preserved for the rest.
    fn parse(&self, document: &Document) -> ParsingResult<Self::Output> {
        let candidates = document.extract_all(&self.item, |card| {
            let title = card.select(&self.title).next().map(inner_text);
            let href = card
                .select(&self.link)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
                .and_then(|href| document.resolve_href(href));
            (title, href)
        });

        let total = candidates.len();
        let products: Vec<Product> = candidates
            .into_iter()
            .filter_map(|candidate| match candidate {
                (Some(title), Some(href)) if !title.is_empty() => Some(Product::new(title, href)),
                _ => None,
            })
            .collect();

        if products.len() < total {
            debug!("Dropped {} incomplete product cards", total - products.len());
        }
        Ok(products)
    }
}

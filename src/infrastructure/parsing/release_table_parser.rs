//! Release index parser: table rows to `ReleaseRow` values

use scraper::Selector;

use super::{Document, PageParser, ParsingResult, SelectorConfig, compile_selector, inner_text};
use crate::domain::ReleaseRow;

pub struct ReleaseTableParser {
    row: Selector,
    cell: Selector,
    anchor: Selector,
    changelog_link_text: String,
}

impl ReleaseTableParser {
    pub fn new(selectors: &SelectorConfig) -> ParsingResult<Self> {
        Ok(Self {
            row: compile_selector(&selectors.release_row)?,
            cell: compile_selector(&selectors.release_cell)?,
            anchor: compile_selector("a")?,
            changelog_link_text: selectors.changelog_link_text.clone(),
        })
    }
}

impl PageParser for ReleaseTableParser {
    type Output = Vec<ReleaseRow>;

    /// Every row is returned, including those without a changelog link.
    /// Missing cells read as empty strings.
    fn parse(&self, document: &Document) -> ParsingResult<Self::Output> {
        Ok(document.extract_all(&self.row, |tr| {
            let mut cells = tr.select(&self.cell).map(inner_text);
            let version = cells.next().unwrap_or_default();
            let date = cells.next().unwrap_or_default();

            // Anchor text must equal the configured label once trimmed; case matters.
            let changelog_url = tr
                .select(&self.anchor)
                .find(|anchor| inner_text(*anchor) == self.changelog_link_text)
                .and_then(|anchor| anchor.value().attr("href"))
                .and_then(|href| document.resolve_href(href));

            ReleaseRow {
                version,
                date,
                changelog_url,
            }
        }))
    }
}

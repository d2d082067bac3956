//! Changelog page parser: title plus the entries of the first list

use scraper::Selector;

use super::{
    Document, PageParser, ParsingError, ParsingResult, SelectorConfig, compile_selector, inner_text,
};
use crate::domain::ChangelogFragment;

pub struct ChangelogParser {
    title: Selector,
    region: Selector,
    list: Selector,
    item: Selector,
}

impl ChangelogParser {
    pub fn new(selectors: &SelectorConfig) -> ParsingResult<Self> {
        Ok(Self {
            title: compile_selector(&selectors.changelog_title)?,
            region: compile_selector(&selectors.changelog_region)?,
            list: compile_selector(&selectors.changelog_list)?,
            item: compile_selector(&selectors.changelog_item)?,
        })
    }
}

impl PageParser for ChangelogParser {
    type Output = ChangelogFragment;

    fn parse(&self, document: &Document) -> ParsingResult<Self::Output> {
        let title = document
            .extract_one(&self.title, inner_text)
            .ok_or_else(|| ParsingError::required_field_missing("title", Some("changelog page")))?;

        let region = document
            .html()
            .select(&self.region)
            .next()
            .ok_or_else(|| ParsingError::required_field_missing("content region", Some("changelog page")))?;
        let list = region
            .select(&self.list)
            .next()
            .ok_or_else(|| ParsingError::required_field_missing("change list", Some("changelog page")))?;

        let entries = list.select(&self.item).map(inner_text).collect();

        Ok(ChangelogFragment { title, entries })
    }
}

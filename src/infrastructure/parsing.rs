//! HTML parsing for release-notes pages
//!
//! Each page kind (landing listing, release table, changelog) gets its own
//! parser implementing [`PageParser`]. Parsers compile their selectors once
//! and work on a [`Document`] snapshot, so they never hold parsed HTML across
//! an await point.

pub mod changelog_parser;
pub mod config;
pub mod document;
pub mod product_list_parser;
pub mod release_table_parser;

pub use changelog_parser::ChangelogParser;
pub use config::SelectorConfig;
pub use document::{Document, compile_selector, inner_text};
pub use product_list_parser::ProductListParser;
pub use release_table_parser::ReleaseTableParser;

pub use super::parsing_error::{ParsingError, ParsingResult};

/// Parser for one kind of page
pub trait PageParser {
    type Output;

    /// Parse a loaded document snapshot
    fn parse(&self, document: &Document) -> ParsingResult<Self::Output>;

    /// Parse raw HTML fetched from `page_url`
    fn parse_source(&self, source: &str, page_url: Option<&str>) -> ParsingResult<Self::Output> {
        let document = Document::parse(source, page_url);
        self.parse(&document)
    }
}

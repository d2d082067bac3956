//! Application layer module
//!
//! Use cases that drive the page fetcher and parsers through one harvest run:
//! discover products, scan each release index, extract new changelogs, then
//! merge and commit.

pub mod changelog_extractor;
pub mod error;
pub mod product_discoverer;
pub mod release_index_scanner;
pub mod scrape_orchestrator;

pub use changelog_extractor::ChangelogExtractor;
pub use error::HarvestError;
pub use product_discoverer::ProductDiscoverer;
pub use release_index_scanner::{ReleaseIndex, ReleaseIndexScanner};
pub use scrape_orchestrator::{HarvestOutcome, ScrapeOrchestrator};

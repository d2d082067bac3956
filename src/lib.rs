//! Release Harvest - incremental release-notes scraper
//!
//! Walks a release-notes site (landing page -> per-product release table ->
//! per-release changelog page), extracts every changelog it has not seen
//! before, and appends the results to a JSON dataset. A ledger of scraped
//! changelog URLs makes repeated runs incremental.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use application::{HarvestError, HarvestOutcome, ScrapeOrchestrator};
pub use domain::{ChangelogRecord, ReleaseDataset, RunSummary, ScrapedUrlLedger};

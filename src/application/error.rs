//! Error taxonomy for a harvest run
//!
//! Only [`HarvestError::PersistedStateCorrupt`] and
//! [`HarvestError::PersistenceFailure`] escape
//! [`ScrapeOrchestrator::run`](super::ScrapeOrchestrator::run); everything
//! else is logged at the loop boundary and the affected unit is skipped.

use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::page_fetcher::FetchError;
use crate::infrastructure::parsing::ParsingError;
use crate::infrastructure::state_store::StoreError;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Product listing did not appear at {url} within {timeout:?}")]
    DiscoveryTimeout { url: String, timeout: Duration },

    #[error("Persisted state is corrupt: {0}")]
    PersistedStateCorrupt(#[source] StoreError),

    #[error("No release table for {product} at {url} within {timeout:?}")]
    ProductScanTimeout {
        product: String,
        url: String,
        timeout: Duration,
    },

    #[error("No changelog for {product} {version}")]
    NoChangelogLink { product: String, version: String },

    #[error("Failed to extract changelog {url}: {reason}")]
    ExtractionError { url: String, reason: String },

    #[error("Run results were not committed: {0}")]
    PersistenceFailure(#[source] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

impl HarvestError {
    pub fn extraction(url: &str, reason: impl ToString) -> Self {
        Self::ExtractionError {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the run can carry on after skipping the affected unit
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ProductScanTimeout { .. }
            | Self::NoChangelogLink { .. }
            | Self::ExtractionError { .. }
            | Self::Fetch(_) => true,
            Self::Parsing(e) => e.is_recoverable(),
            Self::DiscoveryTimeout { .. }
            | Self::PersistedStateCorrupt(_)
            | Self::PersistenceFailure(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_fatal_and_recoverable_classification() {
        let corrupt = HarvestError::PersistedStateCorrupt(StoreError::Corrupt {
            path: PathBuf::from("all-releases.json"),
            reason: "expected value".to_string(),
        });
        assert!(!corrupt.is_recoverable());

        let timeout = HarvestError::DiscoveryTimeout {
            url: "https://example.com".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(!timeout.is_recoverable());

        assert!(HarvestError::extraction("https://example.com/c", "missing title").is_recoverable());
        assert!(
            HarvestError::NoChangelogLink {
                product: "A".to_string(),
                version: "1".to_string(),
            }
            .is_recoverable()
        );
        assert!(!HarvestError::from(ParsingError::invalid_selector("td[[", "bad")).is_recoverable());
    }

    #[test]
    fn test_messages_name_the_failing_unit() {
        let err = HarvestError::ProductScanTimeout {
            product: "Theme".to_string(),
            url: "https://example.com/theme".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(
            err.to_string(),
            "No release table for Theme at https://example.com/theme within 10s"
        );
    }
}

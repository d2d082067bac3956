//! Set of changelog URLs that already produced a record
//!
//! The ledger is the only identity check in the pipeline: a changelog URL is
//! the one thing guaranteed stable across runs, so version/date are never
//! used for deduplication.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Insertion-ordered, grow-only set of scraped changelog URLs.
///
/// Serializes as a plain JSON array of strings in first-scraped order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ScrapedUrlLedger {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl ScrapedUrlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Record a URL. Returns `false` if it was already present.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ScrapedUrlLedger {
    fn from(urls: Vec<String>) -> Self {
        let mut ledger = Self::new();
        for url in urls {
            ledger.insert(url);
        }
        ledger
    }
}

impl From<ScrapedUrlLedger> for Vec<String> {
    fn from(ledger: ScrapedUrlLedger) -> Self {
        ledger.urls
    }
}

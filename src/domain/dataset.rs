use serde::{Deserialize, Serialize};

use super::release::ChangelogRecord;

/// Append-only collection of changelog records accumulated across runs.
///
/// No uniqueness is enforced here; deduplication happens upstream through the
/// [`ScrapedUrlLedger`](super::ScrapedUrlLedger).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseDataset {
    records: Vec<ChangelogRecord>,
}

impl ReleaseDataset {
    /// Existing records first, in their original order, then `new_records`
    /// in the order they were discovered.
    #[must_use]
    pub fn merge(mut self, new_records: Vec<ChangelogRecord>) -> Self {
        self.records.extend(new_records);
        self
    }

    pub fn records(&self) -> &[ChangelogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<ChangelogRecord>> for ReleaseDataset {
    fn from(records: Vec<ChangelogRecord>) -> Self {
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(product: &str, version: &str) -> ChangelogRecord {
        ChangelogRecord {
            product: product.to_string(),
            version: version.to_string(),
            date: "2024-01-01".to_string(),
            title: format!("{product} {version}"),
            changelog_content: vec![],
        }
    }

    #[test]
    fn test_merge_appends_after_existing_records() {
        let existing = ReleaseDataset::from(vec![record("A", "1"), record("B", "1")]);
        let merged = existing.clone().merge(vec![record("A", "2"), record("C", "1")]);

        assert_eq!(merged.len(), 4);
        assert_eq!(&merged.records()[..2], existing.records());
        assert_eq!(merged.records()[2], record("A", "2"));
        assert_eq!(merged.records()[3], record("C", "1"));
    }

    #[test]
    fn test_merge_keeps_duplicate_content() {
        let merged = ReleaseDataset::from(vec![record("A", "1")]).merge(vec![record("A", "1")]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_round_trips_as_plain_array() {
        let dataset = ReleaseDataset::from(vec![record("A", "1")]);
        let json = serde_json::to_string(&dataset).unwrap();
        assert!(json.starts_with('['));
        let back: ReleaseDataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dataset);
    }
}

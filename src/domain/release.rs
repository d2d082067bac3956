use serde::{Deserialize, Serialize};

/// A product listed on the release-notes landing page.
///
/// Rebuilt from the landing page on every run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub title: String,
    pub release_index_url: String,
}

impl Product {
    pub fn new(title: impl Into<String>, release_index_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            release_index_url: release_index_url.into(),
        }
    }
}

/// One row of a product's release table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRow {
    pub version: String,
    /// Date text exactly as the source formats it
    pub date: String,
    /// Absent when the row carries no "Changelog" anchor
    pub changelog_url: Option<String>,
}

/// Title and change entries pulled from a single changelog page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogFragment {
    pub title: String,
    pub entries: Vec<String>,
}

/// The unit of persistence in the release dataset.
///
/// Field names are consumed verbatim by the presentation layer, including the
/// lowercase `changelogcontent` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogRecord {
    pub product: String,
    pub version: String,
    pub date: String,
    pub title: String,
    #[serde(rename = "changelogcontent")]
    pub changelog_content: Vec<String>,
}

impl ChangelogRecord {
    /// Combine the row a changelog was found on with what was extracted from it
    pub fn from_parts(product: &Product, row: &ReleaseRow, fragment: ChangelogFragment) -> Self {
        Self {
            product: product.title.clone(),
            version: row.version.clone(),
            date: row.date.clone(),
            title: fragment.title,
            changelog_content: fragment.entries,
        }
    }
}

//! CSS selectors for the release-notes site
//!
//! Centralized so a markup change only needs a config edit.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::release_notes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One product card on the landing page
    pub product_item: String,
    /// Product title inside a card
    pub product_title: String,
    /// "View all releases" link inside a card
    pub product_link: String,

    /// Rows of a product's release table
    pub release_row: String,
    /// Cells inside a release row (0 = version, 1 = date)
    pub release_cell: String,
    /// Visible text the changelog anchor must match exactly
    pub changelog_link_text: String,

    /// Title element on a changelog page
    pub changelog_title: String,
    /// Region holding the change list
    pub changelog_region: String,
    /// List element inside the region; only the first match is read
    pub changelog_list: String,
    /// Entries inside that list
    pub changelog_item: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            product_item: release_notes::PRODUCT_ITEM.to_string(),
            product_title: release_notes::PRODUCT_TITLE.to_string(),
            product_link: release_notes::PRODUCT_LINK.to_string(),
            release_row: release_notes::RELEASE_ROW.to_string(),
            release_cell: "td".to_string(),
            changelog_link_text: release_notes::CHANGELOG_LINK_TEXT.to_string(),
            changelog_title: release_notes::CHANGELOG_TITLE.to_string(),
            changelog_region: release_notes::CHANGELOG_REGION.to_string(),
            changelog_list: "ul".to_string(),
            changelog_item: "li".to_string(),
        }
    }
}

//! Error types for HTML extraction
//!
//! Parsing failures carry enough context (field, selector, URL) to be logged
//! on their own when the pipeline skips an item.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in HTML")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },
}

impl ParsingError {
    /// Create a required field missing error with context
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(ToString::to_string),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// A bad selector is a configuration problem and will fail on every page.
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::RequiredFieldMissing { .. } | Self::UrlResolutionFailed { .. } => true,
            Self::InvalidSelector { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

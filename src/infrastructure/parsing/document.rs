//! Parsed page snapshot with structured extraction helpers
//!
//! `Document` wraps a `scraper::Html` tree together with the URL it was loaded
//! from, so anchors can be resolved the way a browser's `href` property would.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{ParsingError, ParsingResult};

/// Compile a CSS selector, reporting the offending string on failure
pub fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Text content of an element, trimmed
pub fn inner_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Whether `selector` matches anything in raw HTML
pub fn source_contains(source: &str, selector: &Selector) -> bool {
    Document::parse(source, None).contains(selector)
}

pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    pub fn parse(source: &str, page_url: Option<&str>) -> Self {
        let base_url = page_url.and_then(|url| match Url::parse(url) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Ignoring unparsable page URL {}: {}", url, e);
                None
            }
        });
        Self {
            html: Html::parse_document(source),
            base_url,
        }
    }

    pub const fn html(&self) -> &Html {
        &self.html
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.html.select(selector).next().is_some()
    }

    /// Map every element matching `selector`, in document order
    pub fn extract_all<T, F>(&self, selector: &Selector, map: F) -> Vec<T>
    where
        F: FnMut(ElementRef<'_>) -> T,
    {
        self.html.select(selector).map(map).collect()
    }

    /// Map the first element matching `selector`, if any
    pub fn extract_one<T, F>(&self, selector: &Selector, map: F) -> Option<T>
    where
        F: FnOnce(ElementRef<'_>) -> T,
    {
        self.html.select(selector).next().map(map)
    }

    /// Resolve an anchor's `href` against the page URL.
    ///
    /// Returns `None` for empty hrefs and for relative hrefs that cannot be
    /// resolved.
    pub fn resolve_href(&self, href: &str) -> Option<String> {
        self.try_resolve_href(href).ok()
    }

    fn try_resolve_href(&self, href: &str) -> ParsingResult<String> {
        let href = href.trim();
        if href.is_empty() {
            return Err(ParsingError::required_field_missing("href", None));
        }

        match Url::parse(href) {
            Ok(absolute) => Ok(absolute.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| ParsingError::UrlResolutionFailed {
                    url: href.to_string(),
                    reason: "relative link without a page URL".to_string(),
                    base_url: None,
                })?;
                base.join(href)
                    .map(|joined| joined.to_string())
                    .map_err(|e| ParsingError::UrlResolutionFailed {
                        url: href.to_string(),
                        reason: e.to_string(),
                        base_url: Some(base.to_string()),
                    })
            }
            Err(e) => Err(ParsingError::UrlResolutionFailed {
                url: href.to_string(),
                reason: e.to_string(),
                base_url: self.base_url.as_ref().map(ToString::to_string),
            }),
        }
    }
}

//! Stock-status classification.
//!
//! A [`StatusDocument`] wraps a parsed product page and answers
//! "first element matching this locator". [`classify`] turns that element's
//! text into a [`StockStatus`] using the product's markers and
//! missing-element policy.

use scraper::{ElementRef, Html, Selector};

use crate::models::{Locator, MissingElementPolicy, ProductSpec, StockState, StockStatus};
use crate::normalizer::{contains_marker, matches_exactly, normalize};
use crate::utils::error::{AppError, Result};

/// A parsed, queryable HTML page.
pub struct StatusDocument {
    html: Html,
}

impl StatusDocument {
    /// Parse a fetched body. Blank bodies are rejected; bytes that are not
    /// UTF-8 are replaced rather than refused.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
        let text = String::from_utf8_lossy(body);

        if text.trim().is_empty() {
            return Err(AppError::parse("document is empty"));
        }

        Ok(Self::from_html(&text))
    }

    pub fn from_html(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// First element in document order with the locator's tag and every one
    /// of its classes. Class names are compared literally, so `md:hidden` or
    /// `w-1/2` need no escaping.
    pub fn find(&self, locator: &Locator) -> Result<Option<ElementRef<'_>>> {
        let tag = locator.tag.trim();
        let invalid = || AppError::InvalidLocator {
            selector: locator.to_css(),
        };

        if tag.is_empty()
            || !tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        {
            return Err(invalid());
        }
        let selector = Selector::parse(tag).map_err(|_| invalid())?;

        let wanted: Vec<&str> = locator.class.split_whitespace().collect();
        Ok(self.html.select(&selector).find(|element| {
            wanted
                .iter()
                .all(|class| element.value().classes().any(|c| c == *class))
        }))
    }
}

/// Concatenated text content of an element, like a browser's `textContent`.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Classify `document` against `spec`.
pub fn classify(spec: &ProductSpec, document: &StatusDocument) -> StockStatus {
    let element = match document.find(&spec.locator) {
        Ok(element) => element,
        Err(e) => return StockStatus::parse_error(e.to_string()),
    };

    match element {
        Some(element) => classify_text(spec, &element_text(&element)),
        None => resolve_missing(spec),
    }
}

/// Apply marker rules to already-extracted status text.
///
/// Sold-out markers are checked first and win over any in-stock marker.
/// The returned diagnostic is the text as it appeared on the page.
pub fn classify_text(spec: &ProductSpec, raw_text: &str) -> StockStatus {
    let observed = normalize(raw_text);

    if spec
        .sold_out_markers
        .iter()
        .any(|marker| contains_marker(&observed, marker))
    {
        return StockStatus::out_of_stock(raw_text);
    }

    match &spec.in_stock_markers {
        Some(markers) => {
            if markers.iter().any(|marker| matches_exactly(&observed, marker)) {
                StockStatus::in_stock(raw_text)
            } else {
                StockStatus::indeterminate(raw_text)
            }
        }
        None => StockStatus::in_stock(raw_text),
    }
}

fn resolve_missing(spec: &ProductSpec) -> StockStatus {
    let state = match spec.missing_element_policy {
        MissingElementPolicy::AssumeInStock => StockState::InStock,
        MissingElementPolicy::AssumeOutOfStock => StockState::OutOfStock,
        MissingElementPolicy::Error => StockState::Indeterminate,
    };

    StockStatus::missing_element(
        state,
        format!(
            "status element '{}' not found; page layout may have changed",
            spec.locator.to_css()
        ),
    )
}

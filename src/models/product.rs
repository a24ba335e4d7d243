use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::MissingElementPolicy;
use crate::utils::error::{AppError, Result};

/// Tag + class pair identifying the node that carries stock-status text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Locator {
    pub tag: String,
    /// One or more space-separated class names; all must be present.
    pub class: String,
}

impl Locator {
    pub fn new(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: class.into(),
        }
    }

    /// Selector-style description for logs, e.g. `span.product-stock-status`.
    pub fn to_css(&self) -> String {
        let mut css = self.tag.trim().to_string();
        for class in self.class.split_whitespace() {
            css.push('.');
            css.push_str(class);
        }
        css
    }
}

/// Declarative description of one tracked product and its vendor markup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSpec {
    pub name: String,
    pub url: String,
    pub locator: Locator,
    pub sold_out_markers: Vec<String>,
    #[serde(default)]
    pub in_stock_markers: Option<Vec<String>>,
    #[serde(default)]
    pub missing_element_policy: MissingElementPolicy,
    /// Key for `{VENDOR}_*` environment overrides.
    #[serde(default)]
    pub vendor: Option<String>,
}

impl ProductSpec {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        locator: Locator,
        sold_out_markers: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            locator,
            sold_out_markers,
            in_stock_markers: None,
            missing_element_policy: MissingElementPolicy::default(),
            vendor: None,
        }
    }

    pub fn with_in_stock_markers(mut self, markers: Vec<String>) -> Self {
        self.in_stock_markers = Some(markers);
        self
    }

    pub fn with_missing_element_policy(mut self, policy: MissingElementPolicy) -> Self {
        self.missing_element_policy = policy;
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Product name must not be empty".into()));
        }

        let url = Url::parse(&self.url).map_err(|e| {
            AppError::Validation(format!("Invalid URL for '{}': {}", self.name, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "URL for '{}' must use http or https",
                self.name
            )));
        }

        if self.locator.tag.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Locator tag for '{}' must not be empty",
                self.name
            )));
        }

        if !self.sold_out_markers.iter().any(|m| !m.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "Product '{}' needs at least one sold-out marker",
                self.name
            )));
        }

        if let Some(markers) = &self.in_stock_markers {
            if markers.iter().all(|m| m.trim().is_empty()) {
                return Err(AppError::Validation(format!(
                    "In-stock markers for '{}' are configured but empty",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

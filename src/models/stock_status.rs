use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::StockState;

/// Result of one stock check, with optional diagnostic detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockStatus {
    pub state: StockState,
    /// Observed raw text, or error detail.
    pub diagnostic: Option<String>,
    /// Set when the status node was missing and the product's policy decided.
    #[serde(default)]
    pub fallback: bool,
}

impl StockStatus {
    pub fn new(state: StockState, diagnostic: Option<String>) -> Self {
        Self {
            state,
            diagnostic,
            fallback: false,
        }
    }

    pub fn in_stock(observed: impl Into<String>) -> Self {
        Self::new(StockState::InStock, Some(observed.into()))
    }

    pub fn out_of_stock(observed: impl Into<String>) -> Self {
        Self::new(StockState::OutOfStock, Some(observed.into()))
    }

    pub fn indeterminate(observed: impl Into<String>) -> Self {
        Self::new(StockState::Indeterminate, Some(observed.into()))
    }

    pub fn fetch_error(detail: impl Into<String>) -> Self {
        Self::new(StockState::FetchError, Some(detail.into()))
    }

    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(StockState::ParseError, Some(detail.into()))
    }

    pub fn missing_element(state: StockState, detail: impl Into<String>) -> Self {
        Self {
            state,
            diagnostic: Some(detail.into()),
            fallback: true,
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.state == StockState::InStock
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.diagnostic {
            Some(detail) => write!(f, "{} ({})", self.state, detail),
            None => write!(f, "{}", self.state),
        }
    }
}

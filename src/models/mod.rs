use serde::{Deserialize, Serialize};
use std::fmt;

pub mod product;
pub mod stock_status;
pub mod notification_record;

// Re-exports for convenience
pub use product::*;
pub use stock_status::*;
pub use notification_record::*;

/// How to resolve status when the status node is absent from the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingElementPolicy {
    AssumeInStock,
    AssumeOutOfStock,
    #[default]
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    InStock,
    OutOfStock,
    Indeterminate,
    FetchError,
    ParseError,
}

impl StockState {
    pub fn is_error(&self) -> bool {
        matches!(self, StockState::FetchError | StockState::ParseError)
    }
}

impl fmt::Display for StockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StockState::InStock => "In Stock",
            StockState::OutOfStock => "Out of Stock",
            StockState::Indeterminate => "Indeterminate",
            StockState::FetchError => "Fetch Error",
            StockState::ParseError => "Parse Error",
        };
        f.write_str(label)
    }
}

/// Whether repeated in-stock checks keep alerting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertMode {
    #[default]
    EveryCheck,
    OnTransition,
}

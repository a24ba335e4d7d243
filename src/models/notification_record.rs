use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ProductSpec, StockState, StockStatus};

/// What happened when an alert was (or was not) dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    SkippedNoCredentials,
    Failed(String),
    /// Status was not in stock; the transport was not touched.
    NotAttempted,
}

impl NotificationOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationOutcome::Sent)
    }
}

impl fmt::Display for NotificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationOutcome::Sent => write!(f, "sent"),
            NotificationOutcome::SkippedNoCredentials => write!(f, "skipped (no credentials)"),
            NotificationOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            NotificationOutcome::NotAttempted => write!(f, "not attempted"),
        }
    }
}

/// Per-product, per-run audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRecord {
    pub product_name: String,
    pub url: String,
    pub status: StockStatus,
    pub sent: bool,
    /// `None` when no dispatch was attempted.
    pub outcome: Option<NotificationOutcome>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(
        product: &ProductSpec,
        status: StockStatus,
        outcome: Option<NotificationOutcome>,
    ) -> Self {
        let sent = outcome.as_ref().is_some_and(NotificationOutcome::is_sent);
        Self {
            product_name: product.name.clone(),
            url: product.url.clone(),
            status,
            sent,
            outcome,
            timestamp: Utc::now(),
        }
    }
}

/// Aggregate counts over one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub in_stock: usize,
    pub out_of_stock: usize,
    pub indeterminate: usize,
    pub failed: usize,
    pub notified: usize,
}

impl RunSummary {
    pub fn from_records(records: &[NotificationRecord]) -> Self {
        let mut summary = RunSummary {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            match record.status.state {
                StockState::InStock => summary.in_stock += 1,
                StockState::OutOfStock => summary.out_of_stock += 1,
                StockState::Indeterminate => summary.indeterminate += 1,
                StockState::FetchError | StockState::ParseError => summary.failed += 1,
            }
            if record.sent {
                summary.notified += 1;
            }
        }

        summary
    }

    /// Every product in a non-empty batch failed to fetch or parse.
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.failed == self.total
    }
}

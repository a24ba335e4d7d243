//! One batch over all configured products.
//!
//! Each product goes FETCH -> PARSE -> CLASSIFY -> (DISPATCH) -> RECORD on
//! its own; a failure at any stage becomes a status value on that product's
//! record and never aborts the batch.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::{classify, StatusDocument};
use crate::fetcher::PageFetcher;
use crate::models::{
    AlertMode, NotificationOutcome, NotificationRecord, ProductSpec, RunSummary, StockState,
    StockStatus,
};
use crate::notifier::NotificationDispatcher;

pub struct TrackingRunner {
    fetcher: Arc<dyn PageFetcher>,
    dispatcher: NotificationDispatcher,
    concurrency: usize,
    alert_mode: AlertMode,
    // Per product name: in stock and already alerted, for `OnTransition`.
    alerted: Mutex<HashMap<String, bool>>,
}

impl TrackingRunner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            fetcher,
            dispatcher,
            concurrency: 1,
            alert_mode: AlertMode::EveryCheck,
            alerted: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_alert_mode(mut self, alert_mode: AlertMode) -> Self {
        self.alert_mode = alert_mode;
        self
    }

    /// Check every product and return one record per product, in input order.
    pub async fn run(&self, specs: &[ProductSpec]) -> Vec<NotificationRecord> {
        let run_id = Uuid::new_v4();
        let records: Vec<NotificationRecord> = stream::iter(specs.iter().cloned())
            .map(|spec| async move { self.check_product(&spec).await })
            .buffered(self.concurrency)
            .collect()
            .instrument(info_span!("run", %run_id))
            .await;

        let summary = RunSummary::from_records(&records);
        info!(
            "Run complete: {} checked, {} in stock, {} out of stock, {} indeterminate, {} failed, {} notified",
            summary.total,
            summary.in_stock,
            summary.out_of_stock,
            summary.indeterminate,
            summary.failed,
            summary.notified
        );
        if summary.all_failed() {
            error!(
                "Every product check failed this run ({} of {}); check network access and vendor sites",
                summary.failed, summary.total
            );
        }

        records
    }

    async fn check_product(&self, spec: &ProductSpec) -> NotificationRecord {
        info!("--- CHECK START ---");
        let status = self.resolve_status(spec).await;

        info!("name of product: {}", spec.name);
        info!("link: {}", spec.url);
        info!("status: {}", status.state);
        log_status_detail(spec, &status);
        info!("--- CHECK END ---");

        let outcome = if status.is_in_stock() && self.should_alert(spec, &status) {
            Some(self.dispatcher.notify(spec, &status).await)
        } else {
            None
        };
        self.remember(spec, &status, outcome.as_ref());

        NotificationRecord::new(spec, status, outcome)
    }

    async fn resolve_status(&self, spec: &ProductSpec) -> StockStatus {
        let fetched = AssertUnwindSafe(self.fetcher.fetch(&spec.url))
            .catch_unwind()
            .await;

        let body = match fetched {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => return StockStatus::fetch_error(e.to_string()),
            Err(panic) => {
                return StockStatus::fetch_error(format!(
                    "fetch panicked: {}",
                    panic_message(panic.as_ref())
                ));
            }
        };

        // The parsed document is not Send; keep it inside this closure.
        let classified = std::panic::catch_unwind(AssertUnwindSafe(|| {
            StatusDocument::parse(&body).map(|document| classify(spec, &document))
        }));

        match classified {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => StockStatus::parse_error(e.to_string()),
            Err(panic) => StockStatus::parse_error(format!(
                "parse panicked: {}",
                panic_message(panic.as_ref())
            )),
        }
    }

    fn should_alert(&self, spec: &ProductSpec, status: &StockStatus) -> bool {
        match self.alert_mode {
            AlertMode::EveryCheck => true,
            AlertMode::OnTransition => {
                let already_alerted = self
                    .alerted
                    .lock()
                    .map(|alerted| alerted.get(&spec.name).copied().unwrap_or(false))
                    .unwrap_or(false);
                if already_alerted && status.is_in_stock() {
                    info!("'{}' is still in stock; already alerted", spec.name);
                    return false;
                }
                true
            }
        }
    }

    fn remember(
        &self,
        spec: &ProductSpec,
        status: &StockStatus,
        outcome: Option<&NotificationOutcome>,
    ) {
        // Errors say nothing about stock, so they leave the previous state alone.
        if status.state.is_error() {
            return;
        }
        // No outcome on an in-stock check means the alert was suppressed,
        // i.e. it already went out earlier in this restock.
        let alerted = status.is_in_stock() && outcome.is_none_or(NotificationOutcome::is_sent);
        if let Ok(mut seen) = self.alerted.lock() {
            seen.insert(spec.name.clone(), alerted);
        }
    }
}

fn log_status_detail(spec: &ProductSpec, status: &StockStatus) {
    let detail = status.diagnostic.as_deref().unwrap_or("");
    match status.state {
        StockState::FetchError => error!("Error fetching webpage for {}: {}", spec.name, detail),
        StockState::ParseError => error!("Error parsing webpage for {}: {}", spec.name, detail),
        StockState::Indeterminate if !status.fallback => warn!(
            "Unrecognised status text for {}: '{}'; vendor wording may have changed",
            spec.name, detail
        ),
        _ if status.fallback => warn!("Status element not found for {}: {}", spec.name, detail),
        _ => {}
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

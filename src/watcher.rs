use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::models::{NotificationRecord, ProductSpec};
use crate::runner::TrackingRunner;
use crate::utils::error::Result;

/// Runs batches on a cron schedule until Ctrl-C (or until every product has
/// been alerted, when `stop_when_all_sent` is set).
pub struct Watcher {
    runner: Arc<TrackingRunner>,
    products: Arc<Vec<ProductSpec>>,
    config: SchedulerConfig,
    state: Arc<WatchState>,
}

/// Shared between scheduled jobs.
#[derive(Default)]
struct WatchState {
    // Held for the duration of a batch; a tick that finds it locked is skipped.
    batch: AsyncMutex<()>,
    alerted: Mutex<HashSet<String>>,
    done: Notify,
}

impl Watcher {
    pub fn new(runner: TrackingRunner, products: Vec<ProductSpec>, config: SchedulerConfig) -> Self {
        Self {
            runner: Arc::new(runner),
            products: Arc::new(products),
            config,
            state: Arc::new(WatchState::default()),
        }
    }

    pub async fn run_until_shutdown(self) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        let runner = Arc::clone(&self.runner);
        let products = Arc::clone(&self.products);
        let state = Arc::clone(&self.state);
        let stop_when_all_sent = self.config.stop_when_all_sent;

        let job = Job::new_async(self.config.cron.as_str(), move |_uuid, _lock| {
            let runner = Arc::clone(&runner);
            let products = Arc::clone(&products);
            let state = Arc::clone(&state);
            Box::pin(async move {
                run_batch(&runner, &products, &state, stop_when_all_sent).await;
            })
        })?;
        scheduler.add(job).await?;
        scheduler.start().await?;
        info!("Watching {} products on schedule '{}'", self.products.len(), self.config.cron);

        if self.config.run_on_start {
            run_batch(&self.runner, &self.products, &self.state, stop_when_all_sent).await;
        }

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Shutdown requested");
            }
            _ = self.state.done.notified() => {
                info!("Every product has been alerted; stopping");
            }
        }

        scheduler.shutdown().await?;
        Ok(())
    }
}

async fn run_batch(
    runner: &TrackingRunner,
    products: &[ProductSpec],
    state: &WatchState,
    stop_when_all_sent: bool,
) {
    let Ok(_guard) = state.batch.try_lock() else {
        warn!("Previous check cycle still running; skipping this tick");
        return;
    };

    info!("--- Starting new check cycle at {} ---", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    let records = runner.run(products).await;

    if stop_when_all_sent && record_alerts(state, products, &records) {
        state.done.notify_one();
    }
}

/// Remember which products were alerted; true once all of them have been.
fn record_alerts(state: &WatchState, products: &[ProductSpec], records: &[NotificationRecord]) -> bool {
    let Ok(mut alerted) = state.alerted.lock() else {
        return false;
    };
    for record in records.iter().filter(|r| r.sent) {
        alerted.insert(record.product_name.clone());
    }
    products.iter().all(|p| alerted.contains(&p.name))
}

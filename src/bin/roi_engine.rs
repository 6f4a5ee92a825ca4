//! roi-engine: daily ROI and referral commission server
//!
//! Serves the payout REST API and, when enabled, fires the daily run itself.
//!
//! ## Architecture
//! ```text
//! [cron] --POST /api/roi/scheduled--> [roi-engine] --> sqlite | postgres
//!                                          ^
//!                            [DailyScheduler] (optional)
//! ```
//!
//! ## Configuration
//! - `config.yaml` in the working directory, or the path given as the first
//!   argument, or ROI_ENGINE_CONFIG
//! - ROI_ENGINE__<SECTION>__<KEY> environment overrides
//! - ROI_ENGINE_LOG: tracing filter (default: info)

use std::sync::Arc;

use tracing::{error, info};

use roi_engine::clock::{Clock, SystemClock};
use roi_engine::config::Config;
use roi_engine::handlers::{serve, AppState};
use roi_engine::payout::{BatchDriver, PayoutProcessor, RetryExecutor};
use roi_engine::services::DailyScheduler;
use roi_engine::storage::init_storage;
use roi_engine::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    let stores = init_storage(&config.storage).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let processor = Arc::new(PayoutProcessor::new(
        stores.directory.clone(),
        stores.ledger.clone(),
        clock.clone(),
    ));
    let batch = Arc::new(BatchDriver::new(
        processor.clone(),
        stores.directory.clone(),
        stores.runs.clone(),
    ));
    let retry = Arc::new(RetryExecutor::new(processor, stores.directory.clone()));

    let scheduler = config
        .scheduler
        .enabled
        .then(|| DailyScheduler::new(batch.clone(), clock, &config.scheduler).spawn());

    let state = AppState {
        batch,
        retry,
        runs: stores.runs,
        directory: stores.directory,
    };

    info!(
        address = %config.server.bind_addr(),
        storage = %config.storage.storage_type,
        scheduler = config.scheduler.enabled,
        "roi-engine started"
    );

    let result = serve(state, &config.server, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
    })
    .await;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }

    result
}

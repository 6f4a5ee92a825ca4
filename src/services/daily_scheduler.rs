//! Built-in daily trigger.
//!
//! Sleeps until the next UTC midnight (plus a configured offset) and fires a
//! scheduled batch run. A failed run is logged and the scheduler waits for
//! the following day; the daily guard makes a duplicate external trigger
//! harmless.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::payout::{utc_day_start, BatchDriver};

/// Next instant strictly after `now` that lies `offset_secs` past a UTC
/// midnight.
pub fn next_fire(now: DateTime<Utc>, offset_secs: u32) -> DateTime<Utc> {
    let candidate = utc_day_start(now) + Duration::seconds(i64::from(offset_secs));
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    cancel: tokio::sync::watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop.
    pub fn stop(&self) {
        let _ = self.cancel.send(true);
    }

    /// Stop the scheduler and wait for an in-flight run to finish.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            error!(error = %e, "Daily scheduler task panicked");
        }
    }
}

/// Fires [`BatchDriver::run_scheduled`] once per UTC day.
pub struct DailyScheduler {
    batch: Arc<BatchDriver>,
    clock: Arc<dyn Clock>,
    offset_secs: u32,
}

impl DailyScheduler {
    pub fn new(batch: Arc<BatchDriver>, clock: Arc<dyn Clock>, config: &SchedulerConfig) -> Self {
        Self {
            batch,
            clock,
            offset_secs: config.offset_secs,
        }
    }

    /// Spawn the scheduler loop onto the current runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let task = tokio::spawn(self.run(cancel_rx));
        SchedulerHandle {
            cancel: cancel_tx,
            task,
        }
    }

    async fn run(self, mut cancel_rx: tokio::sync::watch::Receiver<bool>) {
        info!(offset_secs = self.offset_secs, "Daily scheduler started");

        // Never fire twice for the same day even if the clock lags the timer.
        let mut last_fired: Option<DateTime<Utc>> = None;

        loop {
            let now = self.clock.now();
            let from = last_fired.map_or(now, |fired| fired.max(now));
            let fire_at = next_fire(from, self.offset_secs);
            let wait = (fire_at - now).to_std().unwrap_or_default();

            info!(fire_at = %fire_at, "Next scheduled payout run");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_fired = Some(fire_at);
                    match self.batch.run_scheduled().await {
                        Ok(run) => info!(
                            run_id = %run.id,
                            processed = run.processed,
                            skipped = run.skipped,
                            failed = run.failed.len(),
                            "Scheduled payout run finished"
                        ),
                        Err(e) => error!(error = %e, "Scheduled payout run failed"),
                    }
                }
                changed = cancel_rx.changed() => {
                    // A dropped handle counts as a stop request.
                    if changed.is_err() || *cancel_rx.borrow() {
                        info!("Daily scheduler stopped");
                        break;
                    }
                }
            }
        }
    }
}

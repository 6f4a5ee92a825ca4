//! Batch driver.
//!
//! Walks every active investment through the payout pipeline, one ledger
//! transaction at a time, and persists a [`RunLog`]. A failing investment is
//! recorded and the run moves on; only failing to enumerate investments
//! aborts the run, in which case no run log is written.

use std::sync::Arc;

use tracing::{error, info};

use super::guard::CreditMode;
use super::plan::PayoutOrigin;
use super::processor::{PayoutProcessor, ProcessOutcome};
use super::summary::RunAggregator;
use super::Result;
use crate::model::{RunLog, RunTrigger};
use crate::storage::{DirectoryStore, RunLogStore};

/// Drives batch payout runs.
pub struct BatchDriver {
    processor: Arc<PayoutProcessor>,
    directory: Arc<dyn DirectoryStore>,
    runs: Arc<dyn RunLogStore>,
}

impl BatchDriver {
    pub fn new(
        processor: Arc<PayoutProcessor>,
        directory: Arc<dyn DirectoryStore>,
        runs: Arc<dyn RunLogStore>,
    ) -> Self {
        Self {
            processor,
            directory,
            runs,
        }
    }

    /// Daily run fired by the scheduler.
    pub async fn run_scheduled(&self) -> Result<RunLog> {
        self.run(RunTrigger::Scheduled, CreditMode::Guarded).await
    }

    /// Operator-requested run. Investments already credited today are
    /// skipped.
    pub async fn run_manual(&self) -> Result<RunLog> {
        self.run(RunTrigger::Manual, CreditMode::Guarded).await
    }

    /// Operator-requested run that ignores the daily guard.
    ///
    /// Every active investment is credited again, including those already
    /// credited today.
    pub async fn run_forced(&self) -> Result<RunLog> {
        self.run(RunTrigger::Forced, CreditMode::Override).await
    }

    async fn run(&self, trigger: RunTrigger, mode: CreditMode) -> Result<RunLog> {
        let clock = self.processor.clock();
        let started_at = clock.now();

        info!(trigger = %trigger, "starting payout run");

        let investments = self.directory.active_investments().await.map_err(|e| {
            error!(trigger = %trigger, error = %e, "failed to enumerate active investments");
            e
        })?;

        let mut aggregator = RunAggregator::new(trigger, started_at);
        let origin = PayoutOrigin::Batch(trigger);

        for investment in &investments {
            match self.processor.process(investment, mode, origin).await {
                Ok(ProcessOutcome::Processed(payout)) => aggregator.record_processed(&payout),
                Ok(ProcessOutcome::Skipped(_)) => aggregator.record_skipped(),
                Err(e) => {
                    error!(
                        investment_id = %investment.id,
                        error = %e,
                        "investment payout failed"
                    );
                    aggregator.record_failure(investment.id.to_string(), &e);
                }
            }
        }

        let run = aggregator.finish(clock.now());
        self.runs.record_run(&run).await?;

        info!(
            run_id = %run.id,
            trigger = %trigger,
            selected = investments.len(),
            processed = run.processed,
            skipped = run.skipped,
            failed = run.failed.len(),
            total_roi_paid = %run.total_roi_paid,
            total_referral_paid = %run.total_referral_paid,
            "payout run complete"
        );

        Ok(run)
    }
}

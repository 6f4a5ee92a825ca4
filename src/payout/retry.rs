//! Manual retry of specific investments.
//!
//! Re-runs the payout pipeline for operator-supplied investment ids with the
//! daily guard bypassed. This is not idempotent: retrying the same id twice
//! credits it twice.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::guard::CreditMode;
use super::plan::PayoutOrigin;
use super::processor::{PayoutProcessor, ProcessOutcome};
use super::summary::RetryReport;
use super::{PayoutError, Result};
use crate::storage::DirectoryStore;

/// Executes operator retries.
pub struct RetryExecutor {
    processor: Arc<PayoutProcessor>,
    directory: Arc<dyn DirectoryStore>,
}

impl RetryExecutor {
    pub fn new(processor: Arc<PayoutProcessor>, directory: Arc<dyn DirectoryStore>) -> Self {
        Self {
            processor,
            directory,
        }
    }

    /// Credit each listed investment once more, ignoring whether it was
    /// already credited today.
    ///
    /// Each id gets its own transaction; one failure does not affect the
    /// others. No run log is written.
    pub async fn retry(&self, investment_ids: &[String]) -> RetryReport {
        let mut report = RetryReport::default();

        for raw_id in investment_ids {
            match self.retry_one(raw_id).await {
                Ok(()) => report.record_success(raw_id.clone()),
                Err(e) => {
                    error!(investment_id = %raw_id, error = %e, "retry failed");
                    report.record_failure(raw_id.clone(), &e);
                }
            }
        }

        info!(
            requested = investment_ids.len(),
            succeeded = report.success_count,
            failed = report.failed_count,
            "retry complete"
        );

        report
    }

    async fn retry_one(&self, raw_id: &str) -> Result<()> {
        let id = Uuid::parse_str(raw_id.trim())
            .map_err(|_| PayoutError::InvalidInvestmentId(raw_id.to_string()))?;

        let investment = self
            .directory
            .investment(id)
            .await?
            .ok_or(PayoutError::InvestmentNotFound(id))?;

        if !investment.is_earning() {
            return Err(PayoutError::InvestmentInactive(id));
        }

        match self
            .processor
            .process(&investment, CreditMode::Override, PayoutOrigin::Retry)
            .await?
        {
            ProcessOutcome::Processed(_) => Ok(()),
            ProcessOutcome::Skipped(reason) => {
                warn!(investment_id = %id, reason = ?reason, "retry produced no credit");
                Err(PayoutError::NothingToCredit(id))
            }
        }
    }
}

//! Run and retry reporting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::processor::ProcessedPayout;
use crate::model::{FailedItem, RunLog, RunTrigger};

/// Accumulates per-investment outcomes into a [`RunLog`].
#[derive(Debug)]
pub struct RunAggregator {
    id: Uuid,
    trigger: RunTrigger,
    started_at: DateTime<Utc>,
    processed: u32,
    skipped: u32,
    total_roi_paid: Decimal,
    total_referral_paid: Decimal,
    failed: Vec<FailedItem>,
}

impl RunAggregator {
    pub fn new(trigger: RunTrigger, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger,
            started_at,
            processed: 0,
            skipped: 0,
            total_roi_paid: Decimal::ZERO,
            total_referral_paid: Decimal::ZERO,
            failed: Vec::new(),
        }
    }

    pub fn record_processed(&mut self, payout: &ProcessedPayout) {
        self.processed += 1;
        self.total_roi_paid += payout.roi;
        self.total_referral_paid += payout.referral;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failure(&mut self, investment_id: impl Into<String>, error: impl ToString) {
        self.failed.push(FailedItem {
            investment_id: investment_id.into(),
            error: error.to_string(),
        });
    }

    pub fn finish(self, finished_at: DateTime<Utc>) -> RunLog {
        RunLog {
            id: self.id,
            trigger: self.trigger,
            started_at: self.started_at,
            finished_at,
            processed: self.processed,
            skipped: self.skipped,
            total_roi_paid: self.total_roi_paid,
            total_referral_paid: self.total_referral_paid,
            failed: self.failed,
        }
    }
}

/// Per-id outcome of a retry request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryReport {
    pub success_count: usize,
    pub failed_count: usize,
    pub success: Vec<String>,
    pub failed: Vec<FailedItem>,
}

impl RetryReport {
    pub fn record_success(&mut self, investment_id: impl Into<String>) {
        self.success.push(investment_id.into());
        self.success_count = self.success.len();
    }

    pub fn record_failure(&mut self, investment_id: impl Into<String>, error: impl ToString) {
        self.failed.push(FailedItem {
            investment_id: investment_id.into(),
            error: error.to_string(),
        });
        self.failed_count = self.failed.len();
    }
}

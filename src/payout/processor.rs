//! Single-investment payout.
//!
//! Shared by the batch driver and the retry executor so both run the exact
//! same ROI, upline, commission and ledger steps.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::commission::{CommissionDistributor, MAX_UPLINE_DEPTH};
use super::guard::{was_paid_today, CreditMode};
use super::plan::{LedgerOutcome, PayoutOrigin, PayoutPlan};
use super::roi::daily_roi;
use super::upline::UplineResolver;
use super::{PayoutError, Result};
use crate::clock::Clock;
use crate::model::Investment;
use crate::storage::{DirectoryStore, LedgerStore};

/// Why an investment earned nothing this time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already credited on the current UTC day.
    PaidToday,
    /// ROI rounds to zero at ledger precision.
    ZeroRoi,
    /// Lost the in-transaction guard re-check.
    NotEligible,
}

/// Amounts committed for one processed investment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPayout {
    pub roi: Decimal,
    pub referral: Decimal,
    /// Number of commission credits written.
    pub commissions: usize,
}

/// Terminal state of one investment within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Processed(ProcessedPayout),
    Skipped(SkipReason),
}

/// Runs the payout pipeline for one investment.
pub struct PayoutProcessor {
    directory: Arc<dyn DirectoryStore>,
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    upline: UplineResolver,
    commissions: CommissionDistributor,
}

impl PayoutProcessor {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        ledger: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            upline: UplineResolver::new(directory.clone(), MAX_UPLINE_DEPTH),
            commissions: CommissionDistributor::new(directory.clone()),
            directory,
            ledger,
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Pay out `investment` once.
    ///
    /// In [`CreditMode::Guarded`] an investment already credited today is
    /// skipped, both before any work and again inside the ledger
    /// transaction. [`CreditMode::Override`] credits unconditionally.
    pub async fn process(
        &self,
        investment: &Investment,
        mode: CreditMode,
        origin: PayoutOrigin,
    ) -> Result<ProcessOutcome> {
        let now = self.clock.now();

        if mode == CreditMode::Guarded && was_paid_today(investment.last_roi_at, now) {
            debug!(investment_id = %investment.id, "already credited today");
            return Ok(ProcessOutcome::Skipped(SkipReason::PaidToday));
        }

        let roi = daily_roi(investment.amount, investment.daily_roi)?;
        if roi.is_zero() {
            debug!(investment_id = %investment.id, "ROI rounds to zero");
            return Ok(ProcessOutcome::Skipped(SkipReason::ZeroRoi));
        }

        let owner = self
            .directory
            .user(investment.user_id)
            .await?
            .ok_or(PayoutError::UserNotFound(investment.user_id))?;

        let upline = self.upline.resolve_from(&owner).await?;
        let commissions = self.commissions.distribute(roi, &upline).await?;

        let plan = PayoutPlan::build(investment, roi, &commissions, mode, origin, now);

        match self.ledger.apply_payout(&plan).await? {
            LedgerOutcome::Applied(applied) => {
                let payout = ProcessedPayout {
                    roi: plan.roi_amount(),
                    referral: plan.referral_amount(),
                    commissions: applied.len().saturating_sub(1),
                };
                info!(
                    investment_id = %investment.id,
                    origin = origin.as_str(),
                    roi = %payout.roi,
                    referral = %payout.referral,
                    commissions = payout.commissions,
                    "investment credited"
                );
                Ok(ProcessOutcome::Processed(payout))
            }
            LedgerOutcome::NotEligible => match mode {
                CreditMode::Guarded => {
                    debug!(investment_id = %investment.id, "guard re-check rejected credit");
                    Ok(ProcessOutcome::Skipped(SkipReason::NotEligible))
                }
                CreditMode::Override => Err(PayoutError::InvestmentInactive(investment.id)),
            },
        }
    }
}

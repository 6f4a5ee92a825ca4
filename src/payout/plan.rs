//! Ledger write plans.
//!
//! A [`PayoutPlan`] is everything one investment's ROI event writes: the
//! owner's ROI credit and each commission credit. Ledger stores apply a plan
//! atomically or not at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use super::commission::Commission;
use super::guard::CreditMode;
use crate::model::{EarningKind, Investment, RunTrigger};

/// Who asked for the payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutOrigin {
    Batch(RunTrigger),
    Retry,
}

impl PayoutOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutOrigin::Batch(trigger) => trigger.as_str(),
            PayoutOrigin::Retry => "retry",
        }
    }
}

/// One wallet credit.
#[derive(Debug, Clone, PartialEq)]
pub struct Credit {
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub kind: EarningKind,
    pub level: Option<u8>,
    pub description: String,
    /// Stored on the audit entry.
    pub metadata: serde_json::Value,
}

/// All writes for one investment's ROI event.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutPlan {
    pub investment_id: Uuid,
    pub mode: CreditMode,
    /// Becomes the investment's `last_roi_at` and every row's timestamp.
    pub credited_at: DateTime<Utc>,
    pub credits: Vec<Credit>,
}

impl PayoutPlan {
    /// Build the plan for `investment`: owner ROI first, then commissions
    /// nearest level first.
    pub fn build(
        investment: &Investment,
        roi: Decimal,
        commissions: &[Commission],
        mode: CreditMode,
        origin: PayoutOrigin,
        credited_at: DateTime<Utc>,
    ) -> Self {
        let mut credits = Vec::with_capacity(commissions.len() + 1);

        credits.push(Credit {
            user_id: investment.user_id,
            wallet_id: investment.wallet_id,
            amount: roi,
            kind: EarningKind::Roi,
            level: None,
            description: format!(
                "Daily ROI {}% on {}",
                investment.daily_roi.normalize(),
                investment.amount.normalize()
            ),
            metadata: json!({
                "investmentId": investment.id,
                "principal": investment.amount,
                "dailyRoi": investment.daily_roi,
                "origin": origin.as_str(),
            }),
        });

        for commission in commissions {
            credits.push(Credit {
                user_id: commission.user_id,
                wallet_id: commission.wallet_id,
                amount: commission.amount,
                kind: EarningKind::Referral,
                level: Some(commission.level),
                description: format!(
                    "Level {} referral commission ({}%)",
                    commission.level,
                    commission.percent.normalize()
                ),
                metadata: json!({
                    "investmentId": investment.id,
                    "sourceUserId": investment.user_id,
                    "level": commission.level,
                    "percent": commission.percent,
                    "roiAmount": roi,
                    "origin": origin.as_str(),
                }),
            });
        }

        Self {
            investment_id: investment.id,
            mode,
            credited_at,
            credits,
        }
    }

    /// Owner ROI amount.
    pub fn roi_amount(&self) -> Decimal {
        self.total_of(EarningKind::Roi)
    }

    /// Sum of every commission credit.
    pub fn referral_amount(&self) -> Decimal {
        self.total_of(EarningKind::Referral)
    }

    fn total_of(&self, kind: EarningKind) -> Decimal {
        self.credits
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.amount)
            .sum()
    }
}

/// A credit as applied by the ledger, with balances read inside the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCredit {
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub kind: EarningKind,
    pub amount: Decimal,
    pub before: Decimal,
    pub after: Decimal,
}

/// Result of applying a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// Every credit committed.
    Applied(Vec<AppliedCredit>),
    /// The investment no longer qualifies: credited earlier today (guarded
    /// mode) or no longer active. Nothing was written.
    NotEligible,
}

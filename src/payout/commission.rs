//! Referral commission distribution.
//!
//! Each upline level earns a fixed percentage of the ROI event. An ancestor
//! only earns while it owns at least one earning investment; an ineligible
//! ancestor forfeits its own level and nothing else.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use super::roi::percent_of;
use super::upline::Ancestor;
use super::{PayoutError, Result};
use crate::storage::DirectoryStore;

/// Commission percent of the ROI amount per upline level, nearest first.
pub const COMMISSION_TABLE: [Decimal; 10] = [
    Decimal::from_parts(100, 0, 0, false, 1), // 10.0
    Decimal::from_parts(50, 0, 0, false, 1),  // 5.0
    Decimal::from_parts(30, 0, 0, false, 1),  // 3.0
    Decimal::from_parts(20, 0, 0, false, 1),  // 2.0
    Decimal::from_parts(10, 0, 0, false, 1),  // 1.0
    Decimal::from_parts(5, 0, 0, false, 1),   // 0.5
    Decimal::from_parts(5, 0, 0, false, 1),   // 0.5
    Decimal::from_parts(3, 0, 0, false, 1),   // 0.3
    Decimal::from_parts(2, 0, 0, false, 1),   // 0.2
    Decimal::from_parts(1, 0, 0, false, 1),   // 0.1
];

/// Deepest upline level that can earn a commission.
pub const MAX_UPLINE_DEPTH: usize = COMMISSION_TABLE.len();

/// Sum of every level's percent: the ceiling on commissions paid for one
/// ROI event, as a percent of that event.
pub fn table_total_percent() -> Decimal {
    COMMISSION_TABLE.iter().copied().sum()
}

/// Commission percent for a 1-based upline level.
pub fn level_percent(level: u8) -> Option<Decimal> {
    let index = usize::from(level).checked_sub(1)?;
    COMMISSION_TABLE.get(index).copied()
}

/// Commission owed to `level` for a ROI event of `roi`.
pub fn commission_for(roi: Decimal, level: u8) -> Option<Decimal> {
    level_percent(level).and_then(|percent| percent_of(roi, percent))
}

/// Commission credit owed to one ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commission {
    pub level: u8,
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub percent: Decimal,
    pub amount: Decimal,
}

/// Applies the commission table to a resolved upline.
pub struct CommissionDistributor {
    directory: Arc<dyn DirectoryStore>,
}

impl CommissionDistributor {
    pub fn new(directory: Arc<dyn DirectoryStore>) -> Self {
        Self { directory }
    }

    /// Compute the commissions owed for one ROI event.
    ///
    /// Levels outside the table, ineligible ancestors and amounts that
    /// round to zero produce no commission.
    pub async fn distribute(&self, roi: Decimal, upline: &[Ancestor]) -> Result<Vec<Commission>> {
        let mut commissions = Vec::with_capacity(upline.len());

        for ancestor in upline {
            let Some(percent) = level_percent(ancestor.level) else {
                continue;
            };

            if !self.directory.has_active_investment(ancestor.user_id).await? {
                debug!(
                    user_id = %ancestor.user_id,
                    level = ancestor.level,
                    "ancestor has no active investment, level skipped"
                );
                continue;
            }

            let amount = percent_of(roi, percent).ok_or(PayoutError::InvalidRate {
                amount: roi,
                rate: percent,
            })?;
            if amount.is_zero() {
                continue;
            }

            commissions.push(Commission {
                level: ancestor.level,
                user_id: ancestor.user_id,
                wallet_id: ancestor.wallet_id,
                percent,
                amount,
            });
        }

        Ok(commissions)
    }
}

//! Daily ROI calculation.

use rust_decimal::Decimal;

use super::{PayoutError, Result};
use crate::money::round_to_ledger;

/// Apply `percent` to `amount`, rounded to ledger precision.
///
/// Returns `None` when the product overflows `Decimal`.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(percent)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(round_to_ledger)
}

/// Daily return for `principal` at `daily_roi_percent`.
///
/// Negative principals or rates, and products too large to represent, are
/// rejected. A zero result is returned as-is and left to the caller.
pub fn daily_roi(principal: Decimal, daily_roi_percent: Decimal) -> Result<Decimal> {
    let invalid = || PayoutError::InvalidRate {
        amount: principal,
        rate: daily_roi_percent,
    };
    if principal.is_sign_negative() || daily_roi_percent.is_sign_negative() {
        return Err(invalid());
    }
    percent_of(principal, daily_roi_percent).ok_or_else(invalid)
}

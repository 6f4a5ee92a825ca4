//! Ledger precision.
//!
//! Every amount that reaches a wallet is rounded toward zero to
//! [`LEDGER_SCALE`] decimal places and persisted as an integer count of
//! minor units, so storage-side increments stay exact on every backend.
//! Balances and principals are therefore capped at `i64::MAX` minor units,
//! about 9.2e10.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept by the ledger.
pub const LEDGER_SCALE: u32 = 8;

/// Round an amount to ledger precision, never rounding up.
pub fn round_to_ledger(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::ToZero)
}

/// Convert an amount to minor units at ledger precision.
///
/// Returns `None` when the amount does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    let mut scaled = round_to_ledger(amount);
    scaled.rescale(LEDGER_SCALE);
    i64::try_from(scaled.mantissa()).ok()
}

/// Convert minor units back to a decimal amount.
pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, LEDGER_SCALE)
}

//! Daily idempotency guard.
//!
//! An investment earns at most one ordinary credit per UTC calendar day.
//! Eligibility flips at UTC midnight, regardless of how long ago the last
//! credit landed.

use chrono::{DateTime, NaiveTime, Utc};

/// Whether the daily guard is consulted for a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditMode {
    /// At most one credit per investment per UTC day.
    Guarded,
    /// Bypass the daily guard. Every invocation credits again.
    Override,
}

/// True when `last_roi_at` falls on the same UTC calendar day as `now`.
pub fn was_paid_today(last_roi_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_roi_at {
        Some(last) => last.date_naive() == now.date_naive(),
        None => false,
    }
}

/// Midnight UTC at the start of `now`'s calendar day.
pub fn utc_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

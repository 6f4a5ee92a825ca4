//! Shared storage helper functions.
//!
//! Column encodings used by every SQL backend: timestamps as RFC3339 text
//! with fixed microsecond precision (so lexicographic order is time order),
//! money as integer minor units, rates as decimal strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Result, StorageError};
use crate::money;

/// Format a timestamp for storage.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored RFC3339 timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidTimestamp(format!("{raw}: {e}")))
}

pub fn parse_optional_timestamp(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_timestamp).transpose()
}

pub fn parse_uuid(raw: &str) -> Result<Uuid> {
    Ok(Uuid::parse_str(raw)?)
}

/// Convert a ledger amount to the stored integer representation.
pub fn to_units(amount: Decimal) -> Result<i64> {
    money::to_minor_units(amount).ok_or(StorageError::AmountOutOfRange(amount))
}

/// Validate an amount that must be stored exactly, such as a principal.
///
/// Rejects amounts with more than [`money::LEDGER_SCALE`] decimal places and
/// amounts beyond the `i64` minor-unit range (about 9.2e10).
pub fn exact_ledger_amount(amount: Decimal) -> Result<Decimal> {
    if money::round_to_ledger(amount) != amount {
        return Err(StorageError::InvalidDecimal(format!(
            "{amount} has more than {} decimal places",
            money::LEDGER_SCALE
        )));
    }
    to_units(amount)?;
    Ok(amount)
}

pub fn from_units(units: i64) -> Decimal {
    money::from_minor_units(units)
}

/// Parse a rate or principal stored as a decimal string.
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| StorageError::InvalidDecimal(format!("{raw}: {e}")))
}

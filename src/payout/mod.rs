//! ROI and referral commission payout pipeline.
//!
//! Per investment the pipeline runs:
//!
//! ```text
//! guard -> roi -> upline -> commission -> ledger (one transaction)
//! ```
//!
//! [`BatchDriver`] drives it over every active investment and persists a
//! [`RunLog`](crate::model::RunLog). [`RetryExecutor`] drives it over an
//! explicit id list with the daily guard bypassed.

pub mod batch;
pub mod commission;
pub mod guard;
pub mod plan;
pub mod processor;
pub mod retry;
pub mod roi;
pub mod summary;
pub mod upline;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::storage::StorageError;

pub use batch::BatchDriver;
pub use commission::{Commission, CommissionDistributor, COMMISSION_TABLE, MAX_UPLINE_DEPTH};
pub use guard::{utc_day_start, was_paid_today, CreditMode};
pub use plan::{AppliedCredit, Credit, LedgerOutcome, PayoutOrigin, PayoutPlan};
pub use processor::{PayoutProcessor, ProcessOutcome, ProcessedPayout, SkipReason};
pub use retry::RetryExecutor;
pub use summary::{RetryReport, RunAggregator};
pub use upline::{Ancestor, UplineResolver};

/// Result type for payout operations.
pub type Result<T> = std::result::Result<T, PayoutError>;

/// Errors raised while paying out a single investment.
#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Investment not found: {0}")]
    InvestmentNotFound(Uuid),

    #[error("Investment is not active: {0}")]
    InvestmentInactive(Uuid),

    #[error("Invalid investment id: {0}")]
    InvalidInvestmentId(String),

    #[error("Invalid ROI inputs: amount={amount}, rate={rate}")]
    InvalidRate { amount: Decimal, rate: Decimal },

    #[error("Nothing to credit for investment {0}")]
    NothingToCredit(Uuid),
}

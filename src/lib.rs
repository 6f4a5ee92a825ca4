//! roi-engine - daily ROI and referral commission distribution
//!
//! Credits each active investment's daily return to its owner's wallet and
//! pays a ten-level referral commission up the owner's upline, one
//! all-or-nothing ledger transaction per investment.

pub mod clock;
pub mod config;
pub mod handlers;
pub mod model;
pub mod money;
pub mod payout;
pub mod services;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;

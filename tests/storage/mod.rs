//! Shared storage integration tests.
//!
//! Tests the DirectoryStore, LedgerStore and RunLogStore interfaces against
//! every SQL implementation. Each backend module builds a [`Stores`] over a
//! freshly migrated database and runs these test functions through the
//! `run_*_tests!` macros.
//!
//! [`Stores`]: roi_engine::storage::Stores

pub mod directory_tests;
pub mod ledger_tests;
pub mod pipeline_tests;
pub mod run_log_tests;

use uuid::Uuid;

/// Referral code unique across test functions sharing one database.
pub fn unique_code(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

//! Storage interfaces and implementations.
//!
//! Three stores back the payout pipeline:
//! - [`DirectoryStore`]: users, wallets and investments
//! - [`LedgerStore`]: atomic application of payout plans plus the earnings
//!   and audit ledgers they write
//! - [`RunLogStore`]: batch run summaries

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{StorageConfig, StorageType};
use crate::model::{
    AuditEntry, Earning, Investment, InvestmentStatus, NewInvestment, RunLog, User, Wallet,
};
use crate::payout::{LedgerOutcome, PayoutPlan};

pub mod helpers;
pub mod mock;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub mod schema;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub mod sql;

pub use mock::MockStore;

#[cfg(feature = "postgres")]
pub use sql::postgres::{PostgresDirectoryStore, PostgresLedgerStore, PostgresRunLogStore};
#[cfg(feature = "sqlite")]
pub use sql::sqlite::{SqliteDirectoryStore, SqliteLedgerStore, SqliteRunLogStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    #[error("Investment not found: {0}")]
    InvestmentNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Referral code already taken: {0}")]
    DuplicateReferralCode(String),

    #[error("User already has a wallet: {0}")]
    WalletAlreadyOpen(Uuid),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Storage backend not enabled in this build: {0}")]
    BackendDisabled(StorageType),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Users, wallets and investments.
///
/// Implementations:
/// - `MockStore`: in-memory, for tests
/// - `SqliteDirectoryStore` / `PostgresDirectoryStore`: SQL backends
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Create a user with a unique referral code.
    async fn register_user(&self, referral_code: &str, referred_by: Option<&str>) -> Result<User>;

    /// Open the single wallet a user credits into.
    async fn open_wallet(&self, user_id: Uuid) -> Result<Wallet>;

    /// Persist a new investment.
    ///
    /// The principal is stored exactly as integer minor units. Principals with
    /// more than eight decimal places, or above about 9.2e10, are rejected.
    async fn create_investment(&self, investment: NewInvestment) -> Result<Investment>;

    /// Change an investment's lifecycle state.
    async fn set_investment_status(
        &self,
        id: Uuid,
        status: InvestmentStatus,
        is_active: bool,
    ) -> Result<Investment>;

    async fn user(&self, id: Uuid) -> Result<Option<User>>;

    async fn user_by_referral_code(&self, code: &str) -> Result<Option<User>>;

    async fn wallet(&self, id: Uuid) -> Result<Option<Wallet>>;

    async fn wallet_for_user(&self, user_id: Uuid) -> Result<Option<Wallet>>;

    async fn investment(&self, id: Uuid) -> Result<Option<Investment>>;

    /// Every investment with `is_active` set and status ACTIVE, oldest first.
    async fn active_investments(&self) -> Result<Vec<Investment>>;

    /// True when the user owns at least one earning investment.
    async fn has_active_investment(&self, user_id: Uuid) -> Result<bool>;
}

/// Ledger writes and reads.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Apply every credit in `plan` in a single transaction.
    ///
    /// The investment's `last_roi_at` is set to `plan.credited_at` in the
    /// same transaction. In guarded mode the update only matches when the
    /// investment is still earning and was not credited earlier on the same
    /// UTC day; otherwise nothing is written and
    /// [`LedgerOutcome::NotEligible`] is returned. Any error rolls back the
    /// whole plan.
    async fn apply_payout(&self, plan: &PayoutPlan) -> Result<LedgerOutcome>;

    /// Earnings produced by an investment's ROI events, oldest first.
    async fn earnings_for_investment(&self, investment_id: Uuid) -> Result<Vec<Earning>>;

    /// Earnings credited to a user, oldest first.
    async fn earnings_for_user(&self, user_id: Uuid) -> Result<Vec<Earning>>;

    /// Audit entries for a user's wallet mutations, oldest first.
    async fn audit_for_user(&self, user_id: Uuid) -> Result<Vec<AuditEntry>>;
}

/// Batch run summaries.
#[async_trait]
pub trait RunLogStore: Send + Sync {
    async fn record_run(&self, run: &RunLog) -> Result<()>;

    /// Most recent runs, newest first.
    async fn recent_runs(&self, limit: u32) -> Result<Vec<RunLog>>;
}

/// The three stores, sharing one backend.
#[derive(Clone)]
pub struct Stores {
    pub directory: Arc<dyn DirectoryStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub runs: Arc<dyn RunLogStore>,
}

impl Stores {
    /// All three stores served by one in-memory [`MockStore`].
    pub fn in_memory() -> Self {
        let store = Arc::new(MockStore::new());
        Self {
            directory: store.clone(),
            ledger: store.clone(),
            runs: store,
        }
    }
}

/// Initialize storage based on configuration.
///
/// Connects with retry, applies migrations, and returns the stores for the
/// configured backend. Backends compiled out by feature flags are rejected.
pub async fn init_storage(config: &StorageConfig) -> Result<Stores> {
    info!(storage_type = %config.storage_type, "initializing storage");

    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            use crate::storage::sql::sqlite::{connect_sqlite, MIGRATOR};

            info!(path = %config.sqlite.path, "storage: sqlite");
            let pool = connect_sqlite(&config.sqlite.path, config.max_connections).await?;
            MIGRATOR.run(&pool).await?;

            Ok(Stores {
                directory: Arc::new(SqliteDirectoryStore::new(pool.clone())),
                ledger: Arc::new(SqliteLedgerStore::new(pool.clone())),
                runs: Arc::new(SqliteRunLogStore::new(pool)),
            })
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            use crate::storage::sql::postgres::{connect_postgres, MIGRATOR};

            info!("storage: postgres");
            let pool = connect_postgres(&config.postgres.uri, config.max_connections).await?;
            MIGRATOR.run(&pool).await?;

            Ok(Stores {
                directory: Arc::new(PostgresDirectoryStore::new(pool.clone())),
                ledger: Arc::new(PostgresLedgerStore::new(pool.clone())),
                runs: Arc::new(PostgresRunLogStore::new(pool)),
            })
        }
        StorageType::Memory => {
            info!("storage: in-memory (state is lost on exit)");
            Ok(Stores::in_memory())
        }
        #[allow(unreachable_patterns)]
        other => {
            error!(storage_type = %other, "storage backend not compiled in");
            Err(StorageError::BackendDisabled(other))
        }
    }
}

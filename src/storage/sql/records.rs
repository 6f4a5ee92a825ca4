//! Row shapes shared by every SQL backend.
//!
//! Ids and timestamps are TEXT, money is BIGINT minor units, rates are
//! decimal strings, so one record type decodes on SQLite and PostgreSQL.

use crate::model::{
    AuditAction, AuditEntry, Earning, EarningKind, FailedItem, Investment, InvestmentStatus,
    RunLog, RunTrigger, User, Wallet,
};
use crate::storage::helpers::{
    from_units, parse_decimal, parse_optional_timestamp, parse_timestamp, parse_uuid,
};
use crate::storage::{Result, StorageError};

#[derive(sqlx::FromRow)]
pub(crate) struct UserRecord {
    pub id: String,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub created_at: String,
}

impl UserRecord {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            referral_code: self.referral_code,
            referred_by: self.referred_by,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct WalletRecord {
    pub id: String,
    pub user_id: String,
    pub balance: i64,
    pub deposit_balance: i64,
    pub roi_total: i64,
    pub referral_total: i64,
    pub created_at: String,
}

impl WalletRecord {
    pub fn into_wallet(self) -> Result<Wallet> {
        Ok(Wallet {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            balance: from_units(self.balance),
            deposit_balance: from_units(self.deposit_balance),
            roi_total: from_units(self.roi_total),
            referral_total: from_units(self.referral_total),
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct InvestmentRecord {
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub amount: i64,
    pub daily_roi: String,
    pub status: String,
    pub is_active: bool,
    pub last_roi_at: Option<String>,
    pub created_at: String,
}

impl InvestmentRecord {
    pub fn into_investment(self) -> Result<Investment> {
        Ok(Investment {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            wallet_id: parse_uuid(&self.wallet_id)?,
            amount: from_units(self.amount),
            daily_roi: parse_decimal(&self.daily_roi)?,
            status: self
                .status
                .parse::<InvestmentStatus>()
                .map_err(StorageError::Decode)?,
            is_active: self.is_active,
            last_roi_at: parse_optional_timestamp(self.last_roi_at)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EarningRecord {
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub investment_id: String,
    pub amount: i64,
    pub kind: String,
    pub level: Option<i32>,
    pub description: String,
    pub created_at: String,
}

impl EarningRecord {
    pub fn into_earning(self) -> Result<Earning> {
        let level = self
            .level
            .map(u8::try_from)
            .transpose()
            .map_err(|e| StorageError::Decode(format!("earning level: {e}")))?;

        Ok(Earning {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            wallet_id: parse_uuid(&self.wallet_id)?,
            investment_id: parse_uuid(&self.investment_id)?,
            amount: from_units(self.amount),
            kind: self.kind.parse::<EarningKind>().map_err(StorageError::Decode)?,
            level,
            description: self.description,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AuditRecord {
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub action: String,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub metadata: String,
    pub created_at: String,
}

impl AuditRecord {
    pub fn into_entry(self) -> Result<AuditEntry> {
        Ok(AuditEntry {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            wallet_id: parse_uuid(&self.wallet_id)?,
            action: self.action.parse::<AuditAction>().map_err(StorageError::Decode)?,
            amount: from_units(self.amount),
            before: from_units(self.balance_before),
            after: from_units(self.balance_after),
            metadata: serde_json::from_str(&self.metadata)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RunLogRecord {
    pub id: String,
    pub trigger_kind: String,
    pub started_at: String,
    pub finished_at: String,
    pub processed: i32,
    pub skipped: i32,
    pub total_roi_paid: i64,
    pub total_referral_paid: i64,
    pub failed: String,
}

impl RunLogRecord {
    pub fn into_run(self) -> Result<RunLog> {
        let count = |n: i32| {
            u32::try_from(n).map_err(|e| StorageError::Decode(format!("run counter: {e}")))
        };
        let failed: Vec<FailedItem> = serde_json::from_str(&self.failed)?;

        Ok(RunLog {
            id: parse_uuid(&self.id)?,
            trigger: self
                .trigger_kind
                .parse::<RunTrigger>()
                .map_err(StorageError::Decode)?,
            started_at: parse_timestamp(&self.started_at)?,
            finished_at: parse_timestamp(&self.finished_at)?,
            processed: count(self.processed)?,
            skipped: count(self.skipped)?,
            total_roi_paid: from_units(self.total_roi_paid),
            total_referral_paid: from_units(self.total_referral_paid),
            failed,
        })
    }
}

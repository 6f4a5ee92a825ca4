//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! The tables themselves are created by the migrations under `migrations/`.

use sea_query::Iden;

/// Users table schema.
#[derive(Iden, Clone, Copy)]
pub enum Users {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "referral_code"]
    ReferralCode,
    #[iden = "referred_by"]
    ReferredBy,
    #[iden = "created_at"]
    CreatedAt,
}

/// Wallets table schema. Money columns hold minor units.
#[derive(Iden, Clone, Copy)]
pub enum Wallets {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "balance"]
    Balance,
    #[iden = "deposit_balance"]
    DepositBalance,
    #[iden = "roi_total"]
    RoiTotal,
    #[iden = "referral_total"]
    ReferralTotal,
    #[iden = "created_at"]
    CreatedAt,
}

/// Investments table schema.
#[derive(Iden, Clone, Copy)]
pub enum Investments {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "wallet_id"]
    WalletId,
    #[iden = "amount"]
    Amount,
    #[iden = "daily_roi"]
    DailyRoi,
    #[iden = "status"]
    Status,
    #[iden = "is_active"]
    IsActive,
    #[iden = "last_roi_at"]
    LastRoiAt,
    #[iden = "created_at"]
    CreatedAt,
}

/// Earnings ledger schema.
#[derive(Iden, Clone, Copy)]
pub enum Earnings {
    Table,
    #[iden = "seq"]
    Seq,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "wallet_id"]
    WalletId,
    #[iden = "investment_id"]
    InvestmentId,
    #[iden = "amount"]
    Amount,
    #[iden = "kind"]
    Kind,
    #[iden = "level"]
    Level,
    #[iden = "description"]
    Description,
    #[iden = "created_at"]
    CreatedAt,
}

/// Audit log schema.
#[derive(Iden, Clone, Copy)]
pub enum AuditLogs {
    Table,
    #[iden = "seq"]
    Seq,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "wallet_id"]
    WalletId,
    #[iden = "action"]
    Action,
    #[iden = "amount"]
    Amount,
    #[iden = "balance_before"]
    BalanceBefore,
    #[iden = "balance_after"]
    BalanceAfter,
    #[iden = "metadata"]
    Metadata,
    #[iden = "created_at"]
    CreatedAt,
}

/// Batch run summaries.
#[derive(Iden, Clone, Copy)]
pub enum RunLogs {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "trigger_kind"]
    TriggerKind,
    #[iden = "started_at"]
    StartedAt,
    #[iden = "finished_at"]
    FinishedAt,
    #[iden = "processed"]
    Processed,
    #[iden = "skipped"]
    Skipped,
    #[iden = "total_roi_paid"]
    TotalRoiPaid,
    #[iden = "total_referral_paid"]
    TotalReferralPaid,
    #[iden = "failed"]
    Failed,
}

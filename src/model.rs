//! Ledger domain records.
//!
//! Users form a referral forest through `referred_by` codes. Wallets and
//! investments are owned by users. Earnings and audit entries are
//! append-only and always written in pairs, one pair per wallet credit.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Member of the referral forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub referral_code: String,
    /// Referral code of the sponsoring user, if any.
    pub referred_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-user balance holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub deposit_balance: Decimal,
    pub roi_total: Decimal,
    pub referral_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Investment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Pending => "PENDING",
            InvestmentStatus::Active => "ACTIVE",
            InvestmentStatus::Completed => "COMPLETED",
            InvestmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InvestmentStatus::Pending),
            "ACTIVE" => Ok(InvestmentStatus::Active),
            "COMPLETED" => Ok(InvestmentStatus::Completed),
            "CANCELLED" => Ok(InvestmentStatus::Cancelled),
            other => Err(format!("unknown investment status: {}", other)),
        }
    }
}

/// Principal earning a fixed daily percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    /// Principal.
    pub amount: Decimal,
    /// Daily return, in percent of the principal.
    pub daily_roi: Decimal,
    pub status: InvestmentStatus,
    pub is_active: bool,
    /// Last time ROI was credited.
    pub last_roi_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Investment {
    /// True when the investment both earns ROI and qualifies its owner for
    /// downline commissions.
    pub fn is_earning(&self) -> bool {
        self.is_active && self.status == InvestmentStatus::Active
    }
}

/// Input for opening a new investment.
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub daily_roi: Decimal,
    pub status: InvestmentStatus,
    pub is_active: bool,
}

impl NewInvestment {
    /// An active investment for `user_id` paying `daily_roi` percent.
    pub fn active(user_id: Uuid, wallet_id: Uuid, amount: Decimal, daily_roi: Decimal) -> Self {
        Self {
            user_id,
            wallet_id,
            amount,
            daily_roi,
            status: InvestmentStatus::Active,
            is_active: true,
        }
    }
}

/// Kind of credit recorded in the earnings ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarningKind {
    Roi,
    Referral,
}

impl EarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarningKind::Roi => "roi",
            EarningKind::Referral => "referral",
        }
    }

    /// Audit action paired with this kind of credit.
    pub fn audit_action(&self) -> AuditAction {
        match self {
            EarningKind::Roi => AuditAction::RoiCredit,
            EarningKind::Referral => AuditAction::ReferralCredit,
        }
    }
}

impl FromStr for EarningKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roi" => Ok(EarningKind::Roi),
            "referral" => Ok(EarningKind::Referral),
            other => Err(format!("unknown earning kind: {}", other)),
        }
    }
}

/// Immutable earnings ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Earning {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    /// Investment whose ROI event produced this credit.
    pub investment_id: Uuid,
    pub amount: Decimal,
    pub kind: EarningKind,
    /// Upline level for referral credits (1 = direct sponsor).
    pub level: Option<u8>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Audit action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RoiCredit,
    ReferralCredit,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RoiCredit => "ROI_CREDIT",
            AuditAction::ReferralCredit => "REFERRAL_CREDIT",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROI_CREDIT" => Ok(AuditAction::RoiCredit),
            "REFERRAL_CREDIT" => Ok(AuditAction::ReferralCredit),
            other => Err(format!("unknown audit action: {}", other)),
        }
    }
}

/// Immutable record of one wallet mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub action: AuditAction,
    pub amount: Decimal,
    pub before: Decimal,
    pub after: Decimal,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// What started a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    /// Daily scheduler at UTC midnight.
    Scheduled,
    /// Operator-requested run; still honours the daily guard.
    Manual,
    /// Operator-requested run that bypasses the daily guard.
    Forced,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Scheduled => "scheduled",
            RunTrigger::Manual => "manual",
            RunTrigger::Forced => "forced",
        }
    }
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(RunTrigger::Scheduled),
            "manual" => Ok(RunTrigger::Manual),
            "forced" => Ok(RunTrigger::Forced),
            other => Err(format!("unknown run trigger: {}", other)),
        }
    }
}

/// One investment that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub investment_id: String,
    pub error: String,
}

/// Summary persisted once per batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLog {
    pub id: Uuid,
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processed: u32,
    pub skipped: u32,
    pub total_roi_paid: Decimal,
    pub total_referral_paid: Decimal,
    pub failed: Vec<FailedItem>,
}

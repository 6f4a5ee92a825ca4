use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::MockStore;
use crate::model::{AuditEntry, Earning, EarningKind, Wallet};
use crate::money::to_minor_units;
use crate::payout::{utc_day_start, AppliedCredit, CreditMode, LedgerOutcome, PayoutPlan};
use crate::storage::{LedgerStore, Result, StorageError};

#[async_trait]
impl LedgerStore for MockStore {
    async fn apply_payout(&self, plan: &PayoutPlan) -> Result<LedgerOutcome> {
        if self.fail_payout_for.read().await.contains(&plan.investment_id) {
            return Err(StorageError::Unavailable(format!(
                "payout disabled for investment {}",
                plan.investment_id
            )));
        }
        let fail_on_audit = *self.fail_on_audit.read().await;

        let mut state = self.state.write().await;

        let investment = state
            .investments
            .get(&plan.investment_id)
            .ok_or(StorageError::InvestmentNotFound(plan.investment_id))?;

        let eligible = investment.is_earning()
            && match plan.mode {
                CreditMode::Guarded => investment
                    .last_roi_at
                    .map_or(true, |last| last < utc_day_start(plan.credited_at)),
                CreditMode::Override => true,
            };
        if !eligible {
            return Ok(LedgerOutcome::NotEligible);
        }

        // Only the wallets this plan touches are staged; nothing reaches
        // `state` until every credit has succeeded.
        let mut staged: HashMap<Uuid, Wallet> = HashMap::new();
        let mut earnings = Vec::with_capacity(plan.credits.len());
        let mut audit = Vec::with_capacity(plan.credits.len());
        let mut applied = Vec::with_capacity(plan.credits.len());

        for credit in &plan.credits {
            let wallet = match staged.entry(credit.wallet_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let wallet = state
                        .wallets
                        .get(&credit.wallet_id)
                        .cloned()
                        .ok_or(StorageError::WalletNotFound(credit.wallet_id))?;
                    entry.insert(wallet)
                }
            };
            if wallet.user_id != credit.user_id {
                return Err(StorageError::WalletNotFound(credit.wallet_id));
            }

            let before = wallet.balance;
            let after = before
                .checked_add(credit.amount)
                .filter(|after| to_minor_units(*after).is_some())
                .ok_or(StorageError::AmountOutOfRange(credit.amount))?;
            wallet.balance = after;
            match credit.kind {
                EarningKind::Roi => wallet.roi_total += credit.amount,
                EarningKind::Referral => wallet.referral_total += credit.amount,
            }

            earnings.push(Earning {
                id: Uuid::new_v4(),
                user_id: credit.user_id,
                wallet_id: credit.wallet_id,
                investment_id: plan.investment_id,
                amount: credit.amount,
                kind: credit.kind,
                level: credit.level,
                description: credit.description.clone(),
                created_at: plan.credited_at,
            });

            if fail_on_audit {
                return Err(StorageError::Unavailable("audit log write failed".to_string()));
            }
            audit.push(AuditEntry {
                id: Uuid::new_v4(),
                user_id: credit.user_id,
                wallet_id: credit.wallet_id,
                action: credit.kind.audit_action(),
                amount: credit.amount,
                before,
                after,
                metadata: credit.metadata.clone(),
                created_at: plan.credited_at,
            });

            applied.push(AppliedCredit {
                user_id: credit.user_id,
                wallet_id: credit.wallet_id,
                kind: credit.kind,
                amount: credit.amount,
                before,
                after,
            });
        }

        if let Some(investment) = state.investments.get_mut(&plan.investment_id) {
            investment.last_roi_at = Some(plan.credited_at);
        }
        state.wallets.extend(staged);
        state.earnings.extend(earnings);
        state.audit.extend(audit);
        Ok(LedgerOutcome::Applied(applied))
    }

    async fn earnings_for_investment(&self, investment_id: Uuid) -> Result<Vec<Earning>> {
        Ok(self
            .state
            .read()
            .await
            .earnings
            .iter()
            .filter(|e| e.investment_id == investment_id)
            .cloned()
            .collect())
    }

    async fn earnings_for_user(&self, user_id: Uuid) -> Result<Vec<Earning>> {
        Ok(self
            .state
            .read()
            .await
            .earnings
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn audit_for_user(&self, user_id: Uuid) -> Result<Vec<AuditEntry>> {
        Ok(self
            .state
            .read()
            .await
            .audit
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

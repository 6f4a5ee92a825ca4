use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::MockStore;
use crate::model::{Investment, InvestmentStatus, NewInvestment, User, Wallet};
use crate::storage::helpers::exact_ledger_amount;
use crate::storage::{DirectoryStore, Result, StorageError};

#[async_trait]
impl DirectoryStore for MockStore {
    async fn register_user(&self, referral_code: &str, referred_by: Option<&str>) -> Result<User> {
        let mut state = self.state.write().await;
        if state.user_by_code.contains_key(referral_code) {
            return Err(StorageError::DuplicateReferralCode(referral_code.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            referral_code: referral_code.to_string(),
            referred_by: referred_by.map(str::to_string),
            created_at: Utc::now(),
        };
        state.user_by_code.insert(user.referral_code.clone(), user.id);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn open_wallet(&self, user_id: Uuid) -> Result<Wallet> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StorageError::UserNotFound(user_id));
        }
        if state.wallet_by_user.contains_key(&user_id) {
            return Err(StorageError::WalletAlreadyOpen(user_id));
        }

        let wallet = Wallet {
            id: Uuid::new_v4(),
            user_id,
            balance: Decimal::ZERO,
            deposit_balance: Decimal::ZERO,
            roi_total: Decimal::ZERO,
            referral_total: Decimal::ZERO,
            created_at: Utc::now(),
        };
        state.wallet_by_user.insert(user_id, wallet.id);
        state.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn create_investment(&self, new: NewInvestment) -> Result<Investment> {
        let amount = exact_ledger_amount(new.amount)?;
        let mut state = self.state.write().await;
        if !state.users.contains_key(&new.user_id) {
            return Err(StorageError::UserNotFound(new.user_id));
        }

        let investment = Investment {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            wallet_id: new.wallet_id,
            amount,
            daily_roi: new.daily_roi,
            status: new.status,
            is_active: new.is_active,
            last_roi_at: None,
            created_at: Utc::now(),
        };
        state.investment_order.push(investment.id);
        state.investments.insert(investment.id, investment.clone());
        Ok(investment)
    }

    async fn set_investment_status(
        &self,
        id: Uuid,
        status: InvestmentStatus,
        is_active: bool,
    ) -> Result<Investment> {
        let mut state = self.state.write().await;
        let investment = state
            .investments
            .get_mut(&id)
            .ok_or(StorageError::InvestmentNotFound(id))?;
        investment.status = status;
        investment.is_active = is_active;
        Ok(investment.clone())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn user_by_referral_code(&self, code: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .user_by_code
            .get(code)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn wallet(&self, id: Uuid) -> Result<Option<Wallet>> {
        Ok(self.state.read().await.wallets.get(&id).cloned())
    }

    async fn wallet_for_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let state = self.state.read().await;
        Ok(state
            .wallet_by_user
            .get(&user_id)
            .and_then(|id| state.wallets.get(id))
            .cloned())
    }

    async fn investment(&self, id: Uuid) -> Result<Option<Investment>> {
        Ok(self.state.read().await.investments.get(&id).cloned())
    }

    async fn active_investments(&self) -> Result<Vec<Investment>> {
        if *self.fail_on_list.read().await {
            return Err(StorageError::Unavailable(
                "investment listing disabled".to_string(),
            ));
        }

        let state = self.state.read().await;
        Ok(state
            .investment_order
            .iter()
            .filter_map(|id| state.investments.get(id))
            .filter(|inv| inv.is_earning())
            .cloned()
            .collect())
    }

    async fn has_active_investment(&self, user_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .investments
            .values()
            .any(|inv| inv.user_id == user_id && inv.is_earning()))
    }
}

//! Test utilities.
//!
//! [`Fixture`] builds referral trees, wallets and investments against any
//! [`DirectoryStore`], so the same setup code drives the mock store in unit
//! tests and the SQL stores in integration tests. Setup failures panic.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::model::{Investment, InvestmentStatus, NewInvestment, User, Wallet};
use crate::storage::DirectoryStore;

/// A registered user together with their wallet.
#[derive(Debug, Clone)]
pub struct Member {
    pub user: User,
    pub wallet: Wallet,
}

/// Builds directory state for tests.
pub struct Fixture {
    directory: Arc<dyn DirectoryStore>,
}

impl Fixture {
    pub fn new(directory: Arc<dyn DirectoryStore>) -> Self {
        Self { directory }
    }

    /// Register `code` (sponsored by `referred_by`) and open their wallet.
    pub async fn member(&self, code: &str, referred_by: Option<&str>) -> Member {
        let user = self.user_without_wallet(code, referred_by).await;
        let wallet = self
            .directory
            .open_wallet(user.id)
            .await
            .expect("open wallet");
        Member { user, wallet }
    }

    pub async fn user_without_wallet(&self, code: &str, referred_by: Option<&str>) -> User {
        self.directory
            .register_user(code, referred_by)
            .await
            .expect("register user")
    }

    /// A straight line of `len` members, `{prefix}0` at the root and each
    /// later member sponsored by the one before.
    pub async fn chain(&self, prefix: &str, len: usize) -> Vec<Member> {
        let mut members: Vec<Member> = Vec::with_capacity(len);
        for i in 0..len {
            let code = format!("{prefix}{i}");
            let sponsor = members.last().map(|m| m.user.referral_code.clone());
            members.push(self.member(&code, sponsor.as_deref()).await);
        }
        members
    }

    /// An active investment paying `daily_roi` percent into the member's wallet.
    pub async fn invest(&self, member: &Member, amount: Decimal, daily_roi: Decimal) -> Investment {
        self.directory
            .create_investment(NewInvestment::active(
                member.user.id,
                member.wallet.id,
                amount,
                daily_roi,
            ))
            .await
            .expect("create investment")
    }

    /// An investment that neither earns nor qualifies its owner for
    /// commissions.
    pub async fn dormant_investment(
        &self,
        member: &Member,
        amount: Decimal,
        daily_roi: Decimal,
    ) -> Investment {
        self.directory
            .create_investment(NewInvestment {
                status: InvestmentStatus::Pending,
                is_active: false,
                ..NewInvestment::active(member.user.id, member.wallet.id, amount, daily_roi)
            })
            .await
            .expect("create investment")
    }
}

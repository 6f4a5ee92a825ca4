//! In-memory storage for tests and the `memory` backend.
//!
//! One [`MockStore`] serves all three store traits from a single state
//! guarded by a tokio `RwLock`. A payout plan stages copies of the wallets it
//! touches and writes them back, with its earnings and audit rows, only when
//! every credit succeeded. Nothing is persisted, so the `memory` backend is
//! meant for demos and tests.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{AuditEntry, Earning, EarningKind, Investment, RunLog, User, Wallet};

mod directory;
mod ledger;
mod run_log;

#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    users: HashMap<Uuid, User>,
    user_by_code: HashMap<String, Uuid>,
    wallets: HashMap<Uuid, Wallet>,
    wallet_by_user: HashMap<Uuid, Uuid>,
    investments: HashMap<Uuid, Investment>,
    /// Investment ids in creation order.
    investment_order: Vec<Uuid>,
    earnings: Vec<Earning>,
    audit: Vec<AuditEntry>,
    runs: Vec<RunLog>,
}

/// Mock store that keeps everything in memory.
#[derive(Default)]
pub struct MockStore {
    state: RwLock<State>,
    fail_payout_for: RwLock<HashSet<Uuid>>,
    fail_on_audit: RwLock<bool>,
    fail_on_list: RwLock<bool>,
    fail_on_record_run: RwLock<bool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every payout for `investment_id` fail before anything is written.
    pub async fn fail_payout_for(&self, investment_id: Uuid) {
        self.fail_payout_for.write().await.insert(investment_id);
    }

    pub async fn clear_failures(&self) {
        self.fail_payout_for.write().await.clear();
        *self.fail_on_audit.write().await = false;
        *self.fail_on_list.write().await = false;
        *self.fail_on_record_run.write().await = false;
    }

    /// Fail the audit write of every credit, after the wallet and earnings
    /// writes of that credit have been staged.
    pub async fn set_fail_on_audit(&self, fail: bool) {
        *self.fail_on_audit.write().await = fail;
    }

    pub async fn set_fail_on_list(&self, fail: bool) {
        *self.fail_on_list.write().await = fail;
    }

    pub async fn set_fail_on_record_run(&self, fail: bool) {
        *self.fail_on_record_run.write().await = fail;
    }

    pub async fn wallet_snapshot(&self, wallet_id: Uuid) -> Option<Wallet> {
        self.state.read().await.wallets.get(&wallet_id).cloned()
    }

    pub async fn investment_snapshot(&self, id: Uuid) -> Option<Investment> {
        self.state.read().await.investments.get(&id).cloned()
    }

    /// Overwrite a stored investment, bypassing validation.
    pub async fn replace_investment(&self, investment: Investment) {
        let mut state = self.state.write().await;
        if !state.investments.contains_key(&investment.id) {
            state.investment_order.push(investment.id);
        }
        state.investments.insert(investment.id, investment);
    }

    pub async fn investments_of(&self, user_id: Uuid) -> Vec<Investment> {
        let state = self.state.read().await;
        state
            .investment_order
            .iter()
            .filter_map(|id| state.investments.get(id))
            .filter(|inv| inv.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn earnings_snapshot(&self, investment_id: Uuid, kind: EarningKind) -> Vec<Earning> {
        self.state
            .read()
            .await
            .earnings
            .iter()
            .filter(|e| e.investment_id == investment_id && e.kind == kind)
            .cloned()
            .collect()
    }

    pub async fn earnings_of_wallet(&self, wallet_id: Uuid) -> Vec<Earning> {
        self.state
            .read()
            .await
            .earnings
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .cloned()
            .collect()
    }

    pub async fn audit_snapshot(&self, wallet_id: Uuid) -> Vec<AuditEntry> {
        self.state
            .read()
            .await
            .audit
            .iter()
            .filter(|a| a.wallet_id == wallet_id)
            .cloned()
            .collect()
    }

    /// Run logs in the order they were recorded.
    pub async fn run_logs(&self) -> Vec<RunLog> {
        self.state.read().await.runs.clone()
    }
}

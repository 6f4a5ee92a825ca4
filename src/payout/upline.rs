//! Upline chain resolution.
//!
//! Walks `referred_by` pointers from a starting referral code toward the
//! root of its referral tree. The walk stops at the first code that does not
//! resolve, at a repeated code (misconfigured cycle), or after `max_depth`
//! levels.
//!
//! A resolved ancestor without a wallet consumes its level but is left out
//! of the result; the walk continues through it to deeper ancestors.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::Result;
use crate::model::User;
use crate::storage::DirectoryStore;

/// Ancestor able to receive a commission credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    /// Distance from the starting user (1 = direct sponsor).
    pub level: u8,
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub referral_code: String,
}

/// Resolves upline chains against the user directory.
pub struct UplineResolver {
    directory: Arc<dyn DirectoryStore>,
    max_depth: usize,
}

impl UplineResolver {
    pub fn new(directory: Arc<dyn DirectoryStore>, max_depth: usize) -> Self {
        Self {
            directory,
            max_depth,
        }
    }

    /// Resolve the upline of the user owning `start_code`.
    ///
    /// Returns an empty chain when `start_code` itself does not resolve.
    pub async fn resolve(&self, start_code: &str) -> Result<Vec<Ancestor>> {
        match self.directory.user_by_referral_code(start_code).await? {
            Some(user) => self.resolve_from(&user).await,
            None => {
                debug!(referral_code = %start_code, "starting referral code does not resolve");
                Ok(Vec::new())
            }
        }
    }

    /// Resolve the upline of an already-loaded user.
    pub async fn resolve_from(&self, user: &User) -> Result<Vec<Ancestor>> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(user.referral_code.clone());

        let mut next = user.referred_by.clone();
        let mut level = 0usize;

        while level < self.max_depth {
            let Some(code) = next.take() else {
                break;
            };

            if !visited.insert(code.clone()) {
                warn!(
                    user_id = %user.id,
                    referral_code = %code,
                    "referral cycle detected, stopping upline walk"
                );
                break;
            }

            let Some(sponsor) = self.directory.user_by_referral_code(&code).await? else {
                debug!(referral_code = %code, "upline code does not resolve, chain ends");
                break;
            };

            level += 1;

            match self.directory.wallet_for_user(sponsor.id).await? {
                Some(wallet) => ancestors.push(Ancestor {
                    level: level as u8,
                    user_id: sponsor.id,
                    wallet_id: wallet.id,
                    referral_code: sponsor.referral_code.clone(),
                }),
                None => debug!(
                    user_id = %sponsor.id,
                    level,
                    "ancestor has no wallet, skipping level"
                ),
            }

            next = sponsor.referred_by;
        }

        Ok(ancestors)
    }
}

//! DirectoryStore interface tests.
//!
//! These tests verify the contract of the DirectoryStore trait.
//! Each storage implementation should run these tests.

use std::collections::HashSet;

use rust_decimal_macros::dec;
use uuid::Uuid;

use roi_engine::model::{InvestmentStatus, NewInvestment};
use roi_engine::storage::{StorageError, Stores};
use roi_engine::test_utils::Fixture;

use super::unique_code;

// =============================================================================
// Users
// =============================================================================

pub async fn test_register_and_lookup_user(stores: &Stores) {
    let sponsor_code = unique_code("SPONSOR");
    let code = unique_code("MEMBER");

    let sponsor = stores
        .directory
        .register_user(&sponsor_code, None)
        .await
        .expect("register sponsor");
    let user = stores
        .directory
        .register_user(&code, Some(&sponsor_code))
        .await
        .expect("register member");

    let by_id = stores
        .directory
        .user(user.id)
        .await
        .expect("user lookup")
        .expect("user should exist");
    assert_eq!(by_id.referral_code, code);
    assert_eq!(by_id.referred_by.as_deref(), Some(sponsor_code.as_str()));

    let by_code = stores
        .directory
        .user_by_referral_code(&sponsor_code)
        .await
        .expect("code lookup")
        .expect("sponsor should exist");
    assert_eq!(by_code.id, sponsor.id);
    assert!(by_code.referred_by.is_none());

    assert!(stores
        .directory
        .user_by_referral_code(&unique_code("NOBODY"))
        .await
        .expect("code lookup")
        .is_none());
}

pub async fn test_duplicate_referral_code_rejected(stores: &Stores) {
    let code = unique_code("DUP");
    stores
        .directory
        .register_user(&code, None)
        .await
        .expect("first register");

    let err = stores
        .directory
        .register_user(&code, None)
        .await
        .expect_err("duplicate code should fail");
    assert!(
        matches!(&err, StorageError::DuplicateReferralCode(c) if *c == code),
        "unexpected error: {err}"
    );
}

// =============================================================================
// Wallets
// =============================================================================

pub async fn test_one_wallet_per_user(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let member = fx.member(&unique_code("WALLET"), None).await;

    assert!(member.wallet.balance.is_zero());
    assert_eq!(member.wallet.user_id, member.user.id);

    let err = stores
        .directory
        .open_wallet(member.user.id)
        .await
        .expect_err("second wallet should fail");
    assert!(matches!(err, StorageError::WalletAlreadyOpen(id) if id == member.user.id));

    let err = stores
        .directory
        .open_wallet(Uuid::new_v4())
        .await
        .expect_err("wallet for unknown user should fail");
    assert!(matches!(err, StorageError::UserNotFound(_)));

    let by_user = stores
        .directory
        .wallet_for_user(member.user.id)
        .await
        .expect("wallet lookup")
        .expect("wallet should exist");
    assert_eq!(by_user.id, member.wallet.id);

    let by_id = stores
        .directory
        .wallet(member.wallet.id)
        .await
        .expect("wallet lookup")
        .expect("wallet should exist");
    assert_eq!(by_id.user_id, member.user.id);
}

// =============================================================================
// Investments
// =============================================================================

pub async fn test_investment_round_trip_preserves_decimals(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let member = fx.member(&unique_code("INV"), None).await;

    let created = fx.invest(&member, dec!(1234.56789012), dec!(0.875)).await;
    let loaded = stores
        .directory
        .investment(created.id)
        .await
        .expect("investment lookup")
        .expect("investment should exist");

    assert_eq!(loaded.amount, dec!(1234.56789012));
    assert_eq!(loaded.daily_roi, dec!(0.875));
    assert_eq!(loaded.status, InvestmentStatus::Active);
    assert!(loaded.is_active);
    assert!(loaded.last_roi_at.is_none());
    assert_eq!(loaded.wallet_id, member.wallet.id);
}

pub async fn test_inexact_principal_rejected(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let member = fx.member(&unique_code("INEXACT"), None).await;

    let too_precise = stores
        .directory
        .create_investment(NewInvestment::active(
            member.user.id,
            member.wallet.id,
            dec!(10.123456789),
            dec!(1),
        ))
        .await;
    assert!(matches!(too_precise, Err(StorageError::InvalidDecimal(_))));

    let too_large = stores
        .directory
        .create_investment(NewInvestment::active(
            member.user.id,
            member.wallet.id,
            dec!(100_000_000_000),
            dec!(1),
        ))
        .await;
    assert!(matches!(too_large, Err(StorageError::AmountOutOfRange(_))));

    assert!(stores
        .directory
        .active_investments()
        .await
        .expect("list investments")
        .iter()
        .all(|inv| inv.user_id != member.user.id));
}

pub async fn test_active_investments_filter(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let member = fx.member(&unique_code("ACTIVE"), None).await;

    let kept = fx.invest(&member, dec!(10), dec!(1)).await;
    let completed = fx.invest(&member, dec!(20), dec!(1)).await;
    let paused = fx.invest(&member, dec!(30), dec!(1)).await;
    let dormant = fx.dormant_investment(&member, dec!(40), dec!(1)).await;

    stores
        .directory
        .set_investment_status(completed.id, InvestmentStatus::Completed, false)
        .await
        .expect("complete investment");
    let paused = stores
        .directory
        .set_investment_status(paused.id, InvestmentStatus::Active, false)
        .await
        .expect("pause investment");
    assert!(!paused.is_active);

    let active: HashSet<Uuid> = stores
        .directory
        .active_investments()
        .await
        .expect("list active")
        .into_iter()
        .filter(|i| i.user_id == member.user.id)
        .map(|i| i.id)
        .collect();

    assert!(active.contains(&kept.id));
    assert!(!active.contains(&completed.id));
    assert!(!active.contains(&paused.id));
    assert!(!active.contains(&dormant.id));
    assert_eq!(active.len(), 1);

    assert!(stores
        .directory
        .has_active_investment(member.user.id)
        .await
        .expect("has_active"));

    let err = stores
        .directory
        .set_investment_status(Uuid::new_v4(), InvestmentStatus::Cancelled, false)
        .await
        .expect_err("unknown investment should fail");
    assert!(matches!(err, StorageError::InvestmentNotFound(_)));
}

pub async fn test_has_active_investment_requires_earning(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let member = fx.member(&unique_code("IDLE"), None).await;

    assert!(!stores
        .directory
        .has_active_investment(member.user.id)
        .await
        .expect("has_active"));

    fx.dormant_investment(&member, dec!(100), dec!(1)).await;
    assert!(!stores
        .directory
        .has_active_investment(member.user.id)
        .await
        .expect("has_active"));

    stores
        .directory
        .create_investment(NewInvestment::active(
            member.user.id,
            member.wallet.id,
            dec!(5),
            dec!(2),
        ))
        .await
        .expect("create investment");
    assert!(stores
        .directory
        .has_active_investment(member.user.id)
        .await
        .expect("has_active"));
}

/// Run all DirectoryStore interface tests.
#[macro_export]
macro_rules! run_directory_store_tests {
    ($stores:expr) => {
        use $crate::storage::directory_tests::*;

        test_register_and_lookup_user($stores).await;
        println!("  test_register_and_lookup_user: PASSED");

        test_duplicate_referral_code_rejected($stores).await;
        println!("  test_duplicate_referral_code_rejected: PASSED");

        test_one_wallet_per_user($stores).await;
        println!("  test_one_wallet_per_user: PASSED");

        test_investment_round_trip_preserves_decimals($stores).await;
        println!("  test_investment_round_trip_preserves_decimals: PASSED");

        test_inexact_principal_rejected($stores).await;
        println!("  test_inexact_principal_rejected: PASSED");

        test_active_investments_filter($stores).await;
        println!("  test_active_investments_filter: PASSED");

        test_has_active_investment_requires_earning($stores).await;
        println!("  test_has_active_investment_requires_earning: PASSED");
    };
}

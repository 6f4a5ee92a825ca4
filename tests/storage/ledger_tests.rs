//! LedgerStore interface tests.
//!
//! These tests verify the contract of the LedgerStore trait: atomic
//! application of a payout plan, the conditional guard update, and the
//! earnings and audit ledgers written alongside each wallet increment.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use roi_engine::model::{AuditAction, EarningKind, InvestmentStatus};
use roi_engine::payout::{Credit, CreditMode, LedgerOutcome, PayoutPlan};
use roi_engine::storage::{StorageError, Stores};
use roi_engine::test_utils::{Fixture, Member};

use super::unique_code;

fn credit(member: &Member, amount: Decimal, kind: EarningKind, level: Option<u8>) -> Credit {
    Credit {
        user_id: member.user.id,
        wallet_id: member.wallet.id,
        amount,
        kind,
        level,
        description: format!("{} credit", kind.as_str()),
        metadata: json!({ "level": level, "note": "contract" }),
    }
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, d, 0, 0, 7).unwrap()
}

async fn balance(stores: &Stores, member: &Member) -> Decimal {
    stores
        .directory
        .wallet(member.wallet.id)
        .await
        .expect("wallet lookup")
        .expect("wallet should exist")
        .balance
}

// =============================================================================
// apply_payout
// =============================================================================

pub async fn test_apply_payout_credits_every_wallet(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let sponsor = fx.member(&unique_code("L-SPONSOR"), None).await;
    let owner = fx
        .member(&unique_code("L-OWNER"), Some(&sponsor.user.referral_code))
        .await;
    let inv = fx.invest(&owner, dec!(100), dec!(1.5)).await;

    let plan = PayoutPlan {
        investment_id: inv.id,
        mode: CreditMode::Guarded,
        credited_at: day(3),
        credits: vec![
            credit(&owner, dec!(1.5), EarningKind::Roi, None),
            credit(&sponsor, dec!(0.15), EarningKind::Referral, Some(1)),
        ],
    };

    let outcome = stores.ledger.apply_payout(&plan).await.expect("apply");
    let LedgerOutcome::Applied(applied) = outcome else {
        panic!("expected plan to apply");
    };
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].before, Decimal::ZERO);
    assert_eq!(applied[0].after, dec!(1.5));
    assert_eq!(applied[1].wallet_id, sponsor.wallet.id);
    assert_eq!(applied[1].after, dec!(0.15));

    let owner_wallet = stores
        .directory
        .wallet(owner.wallet.id)
        .await
        .expect("wallet lookup")
        .expect("wallet");
    assert_eq!(owner_wallet.balance, dec!(1.5));
    assert_eq!(owner_wallet.roi_total, dec!(1.5));
    assert!(owner_wallet.referral_total.is_zero());

    let sponsor_wallet = stores
        .directory
        .wallet(sponsor.wallet.id)
        .await
        .expect("wallet lookup")
        .expect("wallet");
    assert_eq!(sponsor_wallet.balance, dec!(0.15));
    assert_eq!(sponsor_wallet.referral_total, dec!(0.15));
    assert!(sponsor_wallet.roi_total.is_zero());

    let investment = stores
        .directory
        .investment(inv.id)
        .await
        .expect("investment lookup")
        .expect("investment");
    assert_eq!(investment.last_roi_at, Some(day(3)));

    let earnings = stores
        .ledger
        .earnings_for_investment(inv.id)
        .await
        .expect("earnings");
    assert_eq!(earnings.len(), 2);
    assert_eq!(earnings[0].kind, EarningKind::Roi);
    assert_eq!(earnings[0].user_id, owner.user.id);
    assert_eq!(earnings[0].amount, dec!(1.5));
    assert!(earnings[0].level.is_none());
    assert_eq!(earnings[1].kind, EarningKind::Referral);
    assert_eq!(earnings[1].level, Some(1));
    assert_eq!(earnings[1].created_at, day(3));

    let sponsor_earnings = stores
        .ledger
        .earnings_for_user(sponsor.user.id)
        .await
        .expect("earnings");
    assert_eq!(sponsor_earnings.len(), 1);
    assert_eq!(sponsor_earnings[0].investment_id, inv.id);
}

pub async fn test_audit_snapshots_chain(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let owner = fx.member(&unique_code("A-OWNER"), None).await;
    let inv = fx.invest(&owner, dec!(10), dec!(2.5)).await;

    for d in 1..=3 {
        let plan = PayoutPlan {
            investment_id: inv.id,
            mode: CreditMode::Guarded,
            credited_at: day(d),
            credits: vec![credit(&owner, dec!(0.25), EarningKind::Roi, None)],
        };
        assert!(matches!(
            stores.ledger.apply_payout(&plan).await.expect("apply"),
            LedgerOutcome::Applied(_)
        ));
    }

    let audit = stores
        .ledger
        .audit_for_user(owner.user.id)
        .await
        .expect("audit");
    assert_eq!(audit.len(), 3);
    for (i, entry) in audit.iter().enumerate() {
        let expected_before = dec!(0.25) * Decimal::from(i as u32);
        assert_eq!(entry.action, AuditAction::RoiCredit);
        assert_eq!(entry.amount, dec!(0.25));
        assert_eq!(entry.before, expected_before);
        assert_eq!(entry.after, expected_before + dec!(0.25));
        assert_eq!(entry.metadata["note"], "contract");
    }
    assert_eq!(balance(stores, &owner).await, dec!(0.75));
}

pub async fn test_guarded_same_day_not_eligible(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let owner = fx.member(&unique_code("G-OWNER"), None).await;
    let inv = fx.invest(&owner, dec!(100), dec!(1)).await;

    let mut plan = PayoutPlan {
        investment_id: inv.id,
        mode: CreditMode::Guarded,
        credited_at: day(10),
        credits: vec![credit(&owner, dec!(1), EarningKind::Roi, None)],
    };
    assert!(matches!(
        stores.ledger.apply_payout(&plan).await.expect("first apply"),
        LedgerOutcome::Applied(_)
    ));

    plan.credited_at = day(10) + Duration::hours(23);
    assert_eq!(
        stores.ledger.apply_payout(&plan).await.expect("second apply"),
        LedgerOutcome::NotEligible
    );
    assert_eq!(balance(stores, &owner).await, dec!(1));
    assert_eq!(
        stores
            .ledger
            .earnings_for_investment(inv.id)
            .await
            .expect("earnings")
            .len(),
        1
    );

    // Override ignores the day but still advances last_roi_at.
    plan.mode = CreditMode::Override;
    assert!(matches!(
        stores.ledger.apply_payout(&plan).await.expect("override apply"),
        LedgerOutcome::Applied(_)
    ));
    assert_eq!(balance(stores, &owner).await, dec!(2));

    plan.mode = CreditMode::Guarded;
    plan.credited_at = day(11);
    assert!(matches!(
        stores.ledger.apply_payout(&plan).await.expect("next day apply"),
        LedgerOutcome::Applied(_)
    ));
    assert_eq!(balance(stores, &owner).await, dec!(3));
}

pub async fn test_inactive_investment_not_eligible(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let owner = fx.member(&unique_code("I-OWNER"), None).await;
    let inv = fx.invest(&owner, dec!(100), dec!(1)).await;
    stores
        .directory
        .set_investment_status(inv.id, InvestmentStatus::Completed, false)
        .await
        .expect("complete investment");

    for mode in [CreditMode::Guarded, CreditMode::Override] {
        let plan = PayoutPlan {
            investment_id: inv.id,
            mode,
            credited_at: day(12),
            credits: vec![credit(&owner, dec!(1), EarningKind::Roi, None)],
        };
        assert_eq!(
            stores.ledger.apply_payout(&plan).await.expect("apply"),
            LedgerOutcome::NotEligible
        );
    }
    assert!(balance(stores, &owner).await.is_zero());
}

pub async fn test_unknown_investment_rejected(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let owner = fx.member(&unique_code("U-OWNER"), None).await;
    let missing = Uuid::new_v4();

    let plan = PayoutPlan {
        investment_id: missing,
        mode: CreditMode::Override,
        credited_at: day(12),
        credits: vec![credit(&owner, dec!(1), EarningKind::Roi, None)],
    };
    let err = stores
        .ledger
        .apply_payout(&plan)
        .await
        .expect_err("unknown investment should fail");
    assert!(matches!(err, StorageError::InvestmentNotFound(id) if id == missing));
    assert!(balance(stores, &owner).await.is_zero());
}

pub async fn test_failed_credit_rolls_back_whole_plan(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let sponsor = fx.member(&unique_code("R-SPONSOR"), None).await;
    let owner = fx
        .member(&unique_code("R-OWNER"), Some(&sponsor.user.referral_code))
        .await;
    let inv = fx.invest(&owner, dec!(100), dec!(1)).await;

    let ghost = Credit {
        wallet_id: Uuid::new_v4(),
        ..credit(&sponsor, dec!(0.05), EarningKind::Referral, Some(2))
    };
    let plan = PayoutPlan {
        investment_id: inv.id,
        mode: CreditMode::Guarded,
        credited_at: day(14),
        credits: vec![
            credit(&owner, dec!(1), EarningKind::Roi, None),
            credit(&sponsor, dec!(0.1), EarningKind::Referral, Some(1)),
            ghost.clone(),
        ],
    };

    let err = stores
        .ledger
        .apply_payout(&plan)
        .await
        .expect_err("plan with a missing wallet should fail");
    assert!(matches!(err, StorageError::WalletNotFound(id) if id == ghost.wallet_id));

    assert!(balance(stores, &owner).await.is_zero());
    assert!(balance(stores, &sponsor).await.is_zero());
    assert!(stores
        .ledger
        .earnings_for_investment(inv.id)
        .await
        .expect("earnings")
        .is_empty());
    assert!(stores
        .ledger
        .audit_for_user(owner.user.id)
        .await
        .expect("audit")
        .is_empty());
    let investment = stores
        .directory
        .investment(inv.id)
        .await
        .expect("investment lookup")
        .expect("investment");
    assert!(investment.last_roi_at.is_none());

    // The guard was rolled back too: a corrected plan applies the same day.
    let retry = PayoutPlan {
        credits: plan.credits[..2].to_vec(),
        ..plan
    };
    assert!(matches!(
        stores.ledger.apply_payout(&retry).await.expect("retry apply"),
        LedgerOutcome::Applied(_)
    ));
    assert_eq!(balance(stores, &sponsor).await, dec!(0.1));
}

pub async fn test_wallet_must_belong_to_credited_user(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let owner = fx.member(&unique_code("W-OWNER"), None).await;
    let other = fx.member(&unique_code("W-OTHER"), None).await;
    let inv = fx.invest(&owner, dec!(100), dec!(1)).await;

    let plan = PayoutPlan {
        investment_id: inv.id,
        mode: CreditMode::Guarded,
        credited_at: day(15),
        credits: vec![Credit {
            wallet_id: other.wallet.id,
            ..credit(&owner, dec!(1), EarningKind::Roi, None)
        }],
    };

    assert!(matches!(
        stores.ledger.apply_payout(&plan).await,
        Err(StorageError::WalletNotFound(_))
    ));
    assert!(balance(stores, &other).await.is_zero());
}

fn roi_with_sponsor_cut(
    owner: &Member,
    investment_id: Uuid,
    sponsor: &Member,
    roi: Decimal,
    cut: Decimal,
) -> PayoutPlan {
    PayoutPlan {
        investment_id,
        mode: CreditMode::Guarded,
        credited_at: day(11),
        credits: vec![
            credit(owner, roi, EarningKind::Roi, None),
            credit(sponsor, cut, EarningKind::Referral, Some(1)),
        ],
    }
}

/// Sibling investments crediting one sponsor at the same time must both land,
/// and each audit row must capture the balance its own write saw.
pub async fn test_concurrent_plans_share_sponsor_wallet(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let sponsor = fx.member(&unique_code("L-SHARED"), None).await;
    let left = fx
        .member(&unique_code("L-LEFT"), Some(&sponsor.user.referral_code))
        .await;
    let right = fx
        .member(&unique_code("L-RIGHT"), Some(&sponsor.user.referral_code))
        .await;
    let left_inv = fx.invest(&left, dec!(100), dec!(1)).await;
    let right_inv = fx.invest(&right, dec!(200), dec!(1)).await;

    let left_plan = roi_with_sponsor_cut(&left, left_inv.id, &sponsor, dec!(1), dec!(0.1));
    let right_plan = roi_with_sponsor_cut(&right, right_inv.id, &sponsor, dec!(2), dec!(0.2));

    let (left_outcome, right_outcome) = tokio::join!(
        stores.ledger.apply_payout(&left_plan),
        stores.ledger.apply_payout(&right_plan)
    );
    assert!(matches!(left_outcome.expect("left plan"), LedgerOutcome::Applied(_)));
    assert!(matches!(right_outcome.expect("right plan"), LedgerOutcome::Applied(_)));

    let wallet = stores
        .directory
        .wallet(sponsor.wallet.id)
        .await
        .expect("wallet lookup")
        .expect("wallet should exist");
    assert_eq!(wallet.balance, dec!(0.3));
    assert_eq!(wallet.referral_total, dec!(0.3));

    let mut audit = stores
        .ledger
        .audit_for_user(sponsor.user.id)
        .await
        .expect("audit trail");
    assert_eq!(audit.len(), 2);
    audit.sort_by_key(|entry| entry.before);

    assert_eq!(audit[0].before, Decimal::ZERO);
    assert_eq!(audit[0].after, audit[1].before);
    assert_eq!(audit[1].after, dec!(0.3));
    for entry in &audit {
        assert_eq!(entry.after, entry.before + entry.amount);
    }
}

pub async fn test_smallest_unit_is_exact(stores: &Stores) {
    let fx = Fixture::new(stores.directory.clone());
    let owner = fx.member(&unique_code("P-OWNER"), None).await;
    let inv = fx.invest(&owner, dec!(0.00000100), dec!(1)).await;

    for d in 1..=20 {
        let plan = PayoutPlan {
            investment_id: inv.id,
            mode: CreditMode::Guarded,
            credited_at: day(d),
            credits: vec![credit(&owner, dec!(0.00000001), EarningKind::Roi, None)],
        };
        stores.ledger.apply_payout(&plan).await.expect("apply");
    }

    assert_eq!(balance(stores, &owner).await, dec!(0.00000020));
}

/// Run all LedgerStore interface tests.
#[macro_export]
macro_rules! run_ledger_store_tests {
    ($stores:expr) => {
        use $crate::storage::ledger_tests::*;

        test_apply_payout_credits_every_wallet($stores).await;
        println!("  test_apply_payout_credits_every_wallet: PASSED");

        test_audit_snapshots_chain($stores).await;
        println!("  test_audit_snapshots_chain: PASSED");

        test_guarded_same_day_not_eligible($stores).await;
        println!("  test_guarded_same_day_not_eligible: PASSED");

        test_inactive_investment_not_eligible($stores).await;
        println!("  test_inactive_investment_not_eligible: PASSED");

        test_unknown_investment_rejected($stores).await;
        println!("  test_unknown_investment_rejected: PASSED");

        test_failed_credit_rolls_back_whole_plan($stores).await;
        println!("  test_failed_credit_rolls_back_whole_plan: PASSED");

        test_wallet_must_belong_to_credited_user($stores).await;
        println!("  test_wallet_must_belong_to_credited_user: PASSED");

        test_smallest_unit_is_exact($stores).await;
        println!("  test_smallest_unit_is_exact: PASSED");

        test_concurrent_plans_share_sponsor_wallet($stores).await;
        println!("  test_concurrent_plans_share_sponsor_wallet: PASSED");
    };
}

//! RunLogStore interface tests.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use roi_engine::model::{FailedItem, RunLog, RunTrigger};
use roi_engine::storage::Stores;

fn run_at(day: i64, trigger: RunTrigger) -> RunLog {
    let started_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap() + Duration::days(day);
    RunLog {
        id: Uuid::new_v4(),
        trigger,
        started_at,
        finished_at: started_at + Duration::milliseconds(1250),
        processed: 7,
        skipped: 2,
        total_roi_paid: dec!(12.34567891),
        total_referral_paid: dec!(1.5),
        failed: vec![FailedItem {
            investment_id: Uuid::new_v4().to_string(),
            error: "Wallet not found".to_string(),
        }],
    }
}

pub async fn test_record_run_round_trip(stores: &Stores) {
    let run = run_at(400, RunTrigger::Forced);
    stores.runs.record_run(&run).await.expect("record run");

    let recent = stores.runs.recent_runs(1).await.expect("recent runs");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0], run);
}

pub async fn test_recent_runs_newest_first(stores: &Stores) {
    for day in 500..505 {
        stores
            .runs
            .record_run(&run_at(day, RunTrigger::Scheduled))
            .await
            .expect("record run");
    }
    stores
        .runs
        .record_run(&run_at(499, RunTrigger::Manual))
        .await
        .expect("record run");

    let recent = stores.runs.recent_runs(3).await.expect("recent runs");
    assert_eq!(recent.len(), 3);
    assert!(recent
        .windows(2)
        .all(|pair| pair[0].started_at > pair[1].started_at));
    assert_eq!(recent[0].started_at, run_at(504, RunTrigger::Scheduled).started_at);
    assert!(recent.iter().all(|r| r.trigger == RunTrigger::Scheduled));
}

/// Run all RunLogStore interface tests.
#[macro_export]
macro_rules! run_run_log_store_tests {
    ($stores:expr) => {
        use $crate::storage::run_log_tests::*;

        test_record_run_round_trip($stores).await;
        println!("  test_record_run_round_trip: PASSED");

        test_recent_runs_newest_first($stores).await;
        println!("  test_recent_runs_newest_first: PASSED");
    };
}

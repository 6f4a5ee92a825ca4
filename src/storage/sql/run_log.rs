//! Unified SQL RunLogStore implementation.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of RunLogStore.
pub struct SqlRunLogStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlRunLogStore<DB> {
    /// Create a new SQL run log store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

fn run_columns() -> [crate::storage::schema::RunLogs; 9] {
    use crate::storage::schema::RunLogs;
    [
        RunLogs::Id,
        RunLogs::TriggerKind,
        RunLogs::StartedAt,
        RunLogs::FinishedAt,
        RunLogs::Processed,
        RunLogs::Skipped,
        RunLogs::TotalRoiPaid,
        RunLogs::TotalReferralPaid,
        RunLogs::Failed,
    ]
}

/// Macro to implement RunLogStore for a specific SQL backend.
macro_rules! impl_run_log_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::RunLogStore for SqlRunLogStore<$db_type> {
            async fn record_run(&self, run: &crate::model::RunLog) -> crate::storage::Result<()> {
                use sea_query::Query;

                use crate::storage::helpers::{format_timestamp, to_units};
                use crate::storage::schema::RunLogs;

                let stmt = Query::insert()
                    .into_table(RunLogs::Table)
                    .columns(run_columns())
                    .values_panic([
                        run.id.to_string().into(),
                        run.trigger.as_str().into(),
                        format_timestamp(run.started_at).into(),
                        format_timestamp(run.finished_at).into(),
                        i32::try_from(run.processed).unwrap_or(i32::MAX).into(),
                        i32::try_from(run.skipped).unwrap_or(i32::MAX).into(),
                        to_units(run.total_roi_paid)?.into(),
                        to_units(run.total_referral_paid)?.into(),
                        serde_json::to_string(&run.failed)?.into(),
                    ])
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;
                Ok(())
            }

            async fn recent_runs(
                &self,
                limit: u32,
            ) -> crate::storage::Result<Vec<crate::model::RunLog>> {
                use sea_query::{Order, Query};

                use super::records::RunLogRecord;
                use crate::storage::schema::RunLogs;

                let stmt = Query::select()
                    .columns(run_columns())
                    .from(RunLogs::Table)
                    .order_by(RunLogs::StartedAt, Order::Desc)
                    .limit(u64::from(limit))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let records: Vec<RunLogRecord> =
                    sqlx::query_as(&sql).fetch_all(&self.pool).await?;
                records.into_iter().map(RunLogRecord::into_run).collect()
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_run_log_store!(super::postgres::Postgres, "postgres");
impl_run_log_store!(super::sqlite::Sqlite, "sqlite");

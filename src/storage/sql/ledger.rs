//! Unified SQL LedgerStore implementation.
//!
//! A payout plan is applied on one pooled connection inside a single
//! transaction, driven by a spawned task so that dropping the caller cannot
//! hand the connection back to the pool mid-transaction:
//!
//! 1. conditional `UPDATE investments SET last_roi_at` (the guard re-check)
//! 2. per credit, `UPDATE wallets SET balance = balance + n ... RETURNING balance`
//! 3. per credit, one earnings row and one audit row
//!
//! Balances are incremented in SQL and the pre-credit balance is derived from
//! the returned post-credit balance, so concurrent writers never lose an
//! update and the audit snapshot always matches the committed row.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of LedgerStore.
pub struct SqlLedgerStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlLedgerStore<DB> {
    /// Create a new SQL ledger store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

fn earning_columns() -> [crate::storage::schema::Earnings; 9] {
    use crate::storage::schema::Earnings;
    [
        Earnings::Id,
        Earnings::UserId,
        Earnings::WalletId,
        Earnings::InvestmentId,
        Earnings::Amount,
        Earnings::Kind,
        Earnings::Level,
        Earnings::Description,
        Earnings::CreatedAt,
    ]
}

fn audit_columns() -> [crate::storage::schema::AuditLogs; 9] {
    use crate::storage::schema::AuditLogs;
    [
        AuditLogs::Id,
        AuditLogs::UserId,
        AuditLogs::WalletId,
        AuditLogs::Action,
        AuditLogs::Amount,
        AuditLogs::BalanceBefore,
        AuditLogs::BalanceAfter,
        AuditLogs::Metadata,
        AuditLogs::CreatedAt,
    ]
}

/// Macro to implement LedgerStore for a specific SQL backend.
macro_rules! impl_ledger_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlLedgerStore<$db_type> {
            /// Claim today's credit for the investment. Returns false when the
            /// investment is no longer eligible.
            async fn claim_investment(
                conn: &mut <$db_type as SqlDatabase>::Connection,
                plan: &crate::payout::PayoutPlan,
            ) -> crate::storage::Result<bool> {
                use sea_query::{Cond, Expr, Query};

                use crate::model::InvestmentStatus;
                use crate::payout::{utc_day_start, CreditMode};
                use crate::storage::helpers::format_timestamp;
                use crate::storage::schema::Investments;

                let sql = {
                    let mut cond = Cond::all()
                        .add(Expr::col(Investments::Id).eq(plan.investment_id.to_string()))
                        .add(Expr::col(Investments::Status).eq(InvestmentStatus::Active.as_str()))
                        .add(Expr::col(Investments::IsActive).eq(true));

                    if plan.mode == CreditMode::Guarded {
                        let day_start = format_timestamp(utc_day_start(plan.credited_at));
                        cond = cond.add(
                            Cond::any()
                                .add(Expr::col(Investments::LastRoiAt).is_null())
                                .add(Expr::col(Investments::LastRoiAt).lt(day_start)),
                        );
                    }

                    <$db_type>::build_update(
                        Query::update()
                            .table(Investments::Table)
                            .value(Investments::LastRoiAt, format_timestamp(plan.credited_at))
                            .cond_where(cond)
                            .to_owned(),
                    )
                };
                let result = sqlx::query(&sql).execute(&mut *conn).await?;
                if result.rows_affected() > 0 {
                    return Ok(true);
                }

                let stmt = Query::select()
                    .column(Investments::Id)
                    .from(Investments::Table)
                    .and_where(Expr::col(Investments::Id).eq(plan.investment_id.to_string()))
                    .to_owned();
                let sql = <$db_type>::build_select(stmt);
                let exists: Option<(String,)> =
                    sqlx::query_as(&sql).fetch_optional(&mut *conn).await?;
                match exists {
                    Some(_) => Ok(false),
                    None => Err(crate::storage::StorageError::InvestmentNotFound(
                        plan.investment_id,
                    )),
                }
            }

            async fn apply_credit(
                conn: &mut <$db_type as SqlDatabase>::Connection,
                plan: &crate::payout::PayoutPlan,
                credit: &crate::payout::Credit,
            ) -> crate::storage::Result<crate::payout::AppliedCredit> {
                use sea_query::{Expr, Query};

                use crate::model::EarningKind;
                use crate::storage::helpers::{format_timestamp, from_units, to_units};
                use crate::storage::schema::{AuditLogs, Earnings, Wallets};
                use crate::storage::StorageError;

                let units = to_units(credit.amount)?;
                let total_column = match credit.kind {
                    EarningKind::Roi => Wallets::RoiTotal,
                    EarningKind::Referral => Wallets::ReferralTotal,
                };

                let stmt = Query::update()
                    .table(Wallets::Table)
                    .value(Wallets::Balance, Expr::col(Wallets::Balance).add(units))
                    .value(total_column, Expr::col(total_column).add(units))
                    .and_where(Expr::col(Wallets::Id).eq(credit.wallet_id.to_string()))
                    .and_where(Expr::col(Wallets::UserId).eq(credit.user_id.to_string()))
                    .returning_col(Wallets::Balance)
                    .to_owned();

                let sql = <$db_type>::build_update(stmt);
                let (after_units,): (i64,) = sqlx::query_as(&sql)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or(StorageError::WalletNotFound(credit.wallet_id))?;

                let before = from_units(after_units - units);
                let after = from_units(after_units);
                let amount = from_units(units);
                let created_at = format_timestamp(plan.credited_at);

                let stmt = Query::insert()
                    .into_table(Earnings::Table)
                    .columns(earning_columns())
                    .values_panic([
                        uuid::Uuid::new_v4().to_string().into(),
                        credit.user_id.to_string().into(),
                        credit.wallet_id.to_string().into(),
                        plan.investment_id.to_string().into(),
                        units.into(),
                        credit.kind.as_str().into(),
                        credit.level.map(i32::from).into(),
                        credit.description.clone().into(),
                        created_at.clone().into(),
                    ])
                    .to_owned();
                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&mut *conn).await?;

                let stmt = Query::insert()
                    .into_table(AuditLogs::Table)
                    .columns(audit_columns())
                    .values_panic([
                        uuid::Uuid::new_v4().to_string().into(),
                        credit.user_id.to_string().into(),
                        credit.wallet_id.to_string().into(),
                        credit.kind.audit_action().as_str().into(),
                        units.into(),
                        (after_units - units).into(),
                        after_units.into(),
                        serde_json::to_string(&credit.metadata)?.into(),
                        created_at.into(),
                    ])
                    .to_owned();
                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&mut *conn).await?;

                Ok(crate::payout::AppliedCredit {
                    user_id: credit.user_id,
                    wallet_id: credit.wallet_id,
                    kind: credit.kind,
                    amount,
                    before,
                    after,
                })
            }

            async fn apply_in_transaction(
                conn: &mut <$db_type as SqlDatabase>::Connection,
                plan: &crate::payout::PayoutPlan,
            ) -> crate::storage::Result<crate::payout::LedgerOutcome> {
                use crate::payout::LedgerOutcome;

                if !Self::claim_investment(conn, plan).await? {
                    return Ok(LedgerOutcome::NotEligible);
                }

                let mut applied = Vec::with_capacity(plan.credits.len());
                for credit in &plan.credits {
                    applied.push(Self::apply_credit(conn, plan, credit).await?);
                }
                Ok(LedgerOutcome::Applied(applied))
            }

            async fn apply_on_pool(
                pool: &<$db_type as SqlDatabase>::Pool,
                plan: &crate::payout::PayoutPlan,
            ) -> crate::storage::Result<crate::payout::LedgerOutcome> {
                use crate::payout::LedgerOutcome;

                let mut conn = pool.acquire().await?;
                sqlx::query(<$db_type>::BEGIN).execute(&mut *conn).await?;

                match Self::apply_in_transaction(&mut conn, plan).await {
                    Ok(outcome @ LedgerOutcome::Applied(_)) => {
                        sqlx::query("COMMIT").execute(&mut *conn).await?;
                        Ok(outcome)
                    }
                    Ok(LedgerOutcome::NotEligible) => {
                        sqlx::query("ROLLBACK").execute(&mut *conn).await?;
                        Ok(LedgerOutcome::NotEligible)
                    }
                    Err(e) => {
                        let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                        Err(e)
                    }
                }
            }

            async fn fetch_earnings(
                &self,
                column: crate::storage::schema::Earnings,
                value: String,
            ) -> crate::storage::Result<Vec<crate::model::Earning>> {
                use sea_query::{Expr, Order, Query};

                use super::records::EarningRecord;
                use crate::storage::schema::Earnings;

                let stmt = Query::select()
                    .columns(earning_columns())
                    .from(Earnings::Table)
                    .and_where(Expr::col(column).eq(value))
                    .order_by(Earnings::Seq, Order::Asc)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let records: Vec<EarningRecord> =
                    sqlx::query_as(&sql).fetch_all(&self.pool).await?;
                records.into_iter().map(EarningRecord::into_earning).collect()
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::LedgerStore for SqlLedgerStore<$db_type> {
            async fn apply_payout(
                &self,
                plan: &crate::payout::PayoutPlan,
            ) -> crate::storage::Result<crate::payout::LedgerOutcome> {
                let pool = self.pool.clone();
                let plan = plan.clone();

                // The transaction always runs to COMMIT or ROLLBACK on its own
                // task, even when the caller is dropped mid-plan.
                tokio::spawn(async move { Self::apply_on_pool(&pool, &plan).await })
                    .await
                    .map_err(|e| {
                        crate::storage::StorageError::Unavailable(format!(
                            "payout task failed: {e}"
                        ))
                    })?
            }

            async fn earnings_for_investment(
                &self,
                investment_id: uuid::Uuid,
            ) -> crate::storage::Result<Vec<crate::model::Earning>> {
                self.fetch_earnings(
                    crate::storage::schema::Earnings::InvestmentId,
                    investment_id.to_string(),
                )
                .await
            }

            async fn earnings_for_user(
                &self,
                user_id: uuid::Uuid,
            ) -> crate::storage::Result<Vec<crate::model::Earning>> {
                self.fetch_earnings(crate::storage::schema::Earnings::UserId, user_id.to_string())
                    .await
            }

            async fn audit_for_user(
                &self,
                user_id: uuid::Uuid,
            ) -> crate::storage::Result<Vec<crate::model::AuditEntry>> {
                use sea_query::{Expr, Order, Query};

                use super::records::AuditRecord;
                use crate::storage::schema::AuditLogs;

                let stmt = Query::select()
                    .columns(audit_columns())
                    .from(AuditLogs::Table)
                    .and_where(Expr::col(AuditLogs::UserId).eq(user_id.to_string()))
                    .order_by(AuditLogs::Seq, Order::Asc)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let records: Vec<AuditRecord> =
                    sqlx::query_as(&sql).fetch_all(&self.pool).await?;
                records.into_iter().map(AuditRecord::into_entry).collect()
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_ledger_store!(super::postgres::Postgres, "postgres");
impl_ledger_store!(super::sqlite::Sqlite, "sqlite");

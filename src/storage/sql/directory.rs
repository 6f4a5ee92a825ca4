//! Unified SQL DirectoryStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of DirectoryStore.
pub struct SqlDirectoryStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlDirectoryStore<DB> {
    /// Create a new SQL directory store with the given pool.
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

fn user_columns() -> [crate::storage::schema::Users; 4] {
    use crate::storage::schema::Users;
    [
        Users::Id,
        Users::ReferralCode,
        Users::ReferredBy,
        Users::CreatedAt,
    ]
}

fn wallet_columns() -> [crate::storage::schema::Wallets; 7] {
    use crate::storage::schema::Wallets;
    [
        Wallets::Id,
        Wallets::UserId,
        Wallets::Balance,
        Wallets::DepositBalance,
        Wallets::RoiTotal,
        Wallets::ReferralTotal,
        Wallets::CreatedAt,
    ]
}

pub(crate) fn investment_columns() -> [crate::storage::schema::Investments; 9] {
    use crate::storage::schema::Investments;
    [
        Investments::Id,
        Investments::UserId,
        Investments::WalletId,
        Investments::Amount,
        Investments::DailyRoi,
        Investments::Status,
        Investments::IsActive,
        Investments::LastRoiAt,
        Investments::CreatedAt,
    ]
}

/// Macro to implement DirectoryStore for a specific SQL backend.
macro_rules! impl_directory_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlDirectoryStore<$db_type> {
            async fn fetch_user(
                &self,
                column: crate::storage::schema::Users,
                value: String,
            ) -> crate::storage::Result<Option<crate::model::User>> {
                use sea_query::{Expr, Query};

                use super::records::UserRecord;
                use crate::storage::schema::Users;

                let stmt = Query::select()
                    .columns(user_columns())
                    .from(Users::Table)
                    .and_where(Expr::col(column).eq(value))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let record: Option<UserRecord> =
                    sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
                record.map(UserRecord::into_user).transpose()
            }

            async fn fetch_wallet(
                &self,
                column: crate::storage::schema::Wallets,
                value: String,
            ) -> crate::storage::Result<Option<crate::model::Wallet>> {
                use sea_query::{Expr, Query};

                use super::records::WalletRecord;
                use crate::storage::schema::Wallets;

                let stmt = Query::select()
                    .columns(wallet_columns())
                    .from(Wallets::Table)
                    .and_where(Expr::col(column).eq(value))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let record: Option<WalletRecord> =
                    sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
                record.map(WalletRecord::into_wallet).transpose()
            }

            async fn require_user(&self, user_id: uuid::Uuid) -> crate::storage::Result<()> {
                use crate::storage::schema::Users;

                match self.fetch_user(Users::Id, user_id.to_string()).await? {
                    Some(_) => Ok(()),
                    None => Err(crate::storage::StorageError::UserNotFound(user_id)),
                }
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::DirectoryStore for SqlDirectoryStore<$db_type> {
            async fn register_user(
                &self,
                referral_code: &str,
                referred_by: Option<&str>,
            ) -> crate::storage::Result<crate::model::User> {
                use sea_query::Query;

                use crate::storage::helpers::format_timestamp;
                use crate::storage::schema::Users;
                use crate::storage::StorageError;

                let user = crate::model::User {
                    id: uuid::Uuid::new_v4(),
                    referral_code: referral_code.to_string(),
                    referred_by: referred_by.map(str::to_string),
                    created_at: chrono::Utc::now(),
                };

                let stmt = Query::insert()
                    .into_table(Users::Table)
                    .columns(user_columns())
                    .values_panic([
                        user.id.to_string().into(),
                        user.referral_code.clone().into(),
                        user.referred_by.clone().into(),
                        format_timestamp(user.created_at).into(),
                    ])
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        super::on_unique_violation(e, || {
                            StorageError::DuplicateReferralCode(referral_code.to_string())
                        })
                    })?;

                Ok(user)
            }

            async fn open_wallet(
                &self,
                user_id: uuid::Uuid,
            ) -> crate::storage::Result<crate::model::Wallet> {
                use rust_decimal::Decimal;
                use sea_query::Query;

                use crate::storage::helpers::format_timestamp;
                use crate::storage::schema::Wallets;
                use crate::storage::StorageError;

                self.require_user(user_id).await?;

                let wallet = crate::model::Wallet {
                    id: uuid::Uuid::new_v4(),
                    user_id,
                    balance: Decimal::ZERO,
                    deposit_balance: Decimal::ZERO,
                    roi_total: Decimal::ZERO,
                    referral_total: Decimal::ZERO,
                    created_at: chrono::Utc::now(),
                };

                let stmt = Query::insert()
                    .into_table(Wallets::Table)
                    .columns(wallet_columns())
                    .values_panic([
                        wallet.id.to_string().into(),
                        user_id.to_string().into(),
                        0i64.into(),
                        0i64.into(),
                        0i64.into(),
                        0i64.into(),
                        format_timestamp(wallet.created_at).into(),
                    ])
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        super::on_unique_violation(e, || StorageError::WalletAlreadyOpen(user_id))
                    })?;

                Ok(wallet)
            }

            async fn create_investment(
                &self,
                new: crate::model::NewInvestment,
            ) -> crate::storage::Result<crate::model::Investment> {
                use sea_query::Query;

                use crate::storage::helpers::{exact_ledger_amount, format_timestamp, to_units};
                use crate::storage::schema::Investments;

                let amount = exact_ledger_amount(new.amount)?;
                self.require_user(new.user_id).await?;

                let investment = crate::model::Investment {
                    id: uuid::Uuid::new_v4(),
                    user_id: new.user_id,
                    wallet_id: new.wallet_id,
                    amount,
                    daily_roi: new.daily_roi,
                    status: new.status,
                    is_active: new.is_active,
                    last_roi_at: None,
                    created_at: chrono::Utc::now(),
                };

                let stmt = Query::insert()
                    .into_table(Investments::Table)
                    .columns(investment_columns())
                    .values_panic([
                        investment.id.to_string().into(),
                        investment.user_id.to_string().into(),
                        investment.wallet_id.to_string().into(),
                        to_units(investment.amount)?.into(),
                        investment.daily_roi.normalize().to_string().into(),
                        investment.status.as_str().into(),
                        investment.is_active.into(),
                        Option::<String>::None.into(),
                        format_timestamp(investment.created_at).into(),
                    ])
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;

                Ok(investment)
            }

            async fn set_investment_status(
                &self,
                id: uuid::Uuid,
                status: crate::model::InvestmentStatus,
                is_active: bool,
            ) -> crate::storage::Result<crate::model::Investment> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::Investments;
                use crate::storage::{DirectoryStore, StorageError};

                let stmt = Query::update()
                    .table(Investments::Table)
                    .value(Investments::Status, status.as_str())
                    .value(Investments::IsActive, is_active)
                    .and_where(Expr::col(Investments::Id).eq(id.to_string()))
                    .to_owned();

                let sql = <$db_type>::build_update(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;
                if result.rows_affected() == 0 {
                    return Err(StorageError::InvestmentNotFound(id));
                }

                self.investment(id)
                    .await?
                    .ok_or(StorageError::InvestmentNotFound(id))
            }

            async fn user(
                &self,
                id: uuid::Uuid,
            ) -> crate::storage::Result<Option<crate::model::User>> {
                self.fetch_user(crate::storage::schema::Users::Id, id.to_string())
                    .await
            }

            async fn user_by_referral_code(
                &self,
                code: &str,
            ) -> crate::storage::Result<Option<crate::model::User>> {
                self.fetch_user(crate::storage::schema::Users::ReferralCode, code.to_string())
                    .await
            }

            async fn wallet(
                &self,
                id: uuid::Uuid,
            ) -> crate::storage::Result<Option<crate::model::Wallet>> {
                self.fetch_wallet(crate::storage::schema::Wallets::Id, id.to_string())
                    .await
            }

            async fn wallet_for_user(
                &self,
                user_id: uuid::Uuid,
            ) -> crate::storage::Result<Option<crate::model::Wallet>> {
                self.fetch_wallet(crate::storage::schema::Wallets::UserId, user_id.to_string())
                    .await
            }

            async fn investment(
                &self,
                id: uuid::Uuid,
            ) -> crate::storage::Result<Option<crate::model::Investment>> {
                use sea_query::{Expr, Query};

                use super::records::InvestmentRecord;
                use crate::storage::schema::Investments;

                let stmt = Query::select()
                    .columns(investment_columns())
                    .from(Investments::Table)
                    .and_where(Expr::col(Investments::Id).eq(id.to_string()))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let record: Option<InvestmentRecord> =
                    sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
                record.map(InvestmentRecord::into_investment).transpose()
            }

            async fn active_investments(
                &self,
            ) -> crate::storage::Result<Vec<crate::model::Investment>> {
                use sea_query::{Expr, Order, Query};

                use super::records::InvestmentRecord;
                use crate::model::InvestmentStatus;
                use crate::storage::schema::Investments;

                let stmt = Query::select()
                    .columns(investment_columns())
                    .from(Investments::Table)
                    .and_where(Expr::col(Investments::IsActive).eq(true))
                    .and_where(Expr::col(Investments::Status).eq(InvestmentStatus::Active.as_str()))
                    .order_by(Investments::CreatedAt, Order::Asc)
                    .order_by(Investments::Id, Order::Asc)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let records: Vec<InvestmentRecord> =
                    sqlx::query_as(&sql).fetch_all(&self.pool).await?;
                records
                    .into_iter()
                    .map(InvestmentRecord::into_investment)
                    .collect()
            }

            async fn has_active_investment(
                &self,
                user_id: uuid::Uuid,
            ) -> crate::storage::Result<bool> {
                use sea_query::{Expr, Query};

                use crate::model::InvestmentStatus;
                use crate::storage::schema::Investments;

                let stmt = Query::select()
                    .column(Investments::Id)
                    .from(Investments::Table)
                    .and_where(Expr::col(Investments::UserId).eq(user_id.to_string()))
                    .and_where(Expr::col(Investments::IsActive).eq(true))
                    .and_where(Expr::col(Investments::Status).eq(InvestmentStatus::Active.as_str()))
                    .limit(1)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row: Option<(String,)> =
                    sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
                Ok(row.is_some())
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_directory_store!(super::postgres::Postgres, "postgres");
impl_directory_store!(super::sqlite::Sqlite, "sqlite");

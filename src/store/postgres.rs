//! Postgres store
//!
//! sqlx-backed adapter. The transfer commit runs inside one database
//! transaction; the version predicate on each `UPDATE` is the optimistic
//! concurrency check, and a zero rows-affected count rolls everything back
//! as a conflict.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE accounts (
//!     id            UUID PRIMARY KEY,
//!     document      TEXT NOT NULL UNIQUE,
//!     email         TEXT NOT NULL UNIQUE,
//!     full_name     TEXT NOT NULL,
//!     balance       NUMERIC NOT NULL CHECK (balance >= 0),
//!     account_type  TEXT NOT NULL,
//!     version       BIGINT NOT NULL
//! );
//!
//! CREATE TABLE transactions (
//!     id        UUID PRIMARY KEY,
//!     payer_id  UUID NOT NULL REFERENCES accounts(id),
//!     payee_id  UUID NOT NULL REFERENCES accounts(id),
//!     value     NUMERIC NOT NULL CHECK (value > 0),
//!     timestamp TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    Account, AccountKey, AccountType, Amount, Balance, ParticipantRole, TransactionRecord,
};

use super::{AccountStore, BalanceUpdate, StoreError, TransactionStore, TransferCommit};

type AccountRow = (Uuid, String, String, String, Decimal, String, i64);
type RecordRow = (Uuid, Uuid, Uuid, Decimal, DateTime<Utc>);

/// Postgres-backed account and transaction store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration and check connectivity.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_account(row: AccountRow) -> Result<Account, StoreError> {
        let (id, document, email, full_name, balance, account_type, version) = row;

        let balance = Balance::new(balance)
            .map_err(|e| StoreError::InvalidData(format!("account {id} balance: {e}")))?;
        let account_type: AccountType = account_type
            .parse()
            .map_err(|e: String| StoreError::InvalidData(format!("account {id}: {e}")))?;

        Ok(Account::from_stored(
            id, document, email, full_name, balance, account_type, version,
        ))
    }

    fn map_record(row: RecordRow) -> Result<TransactionRecord, StoreError> {
        let (id, payer_id, payee_id, value, timestamp) = row;

        let value = Amount::new(value)
            .map_err(|e| StoreError::InvalidData(format!("record {id} value: {e}")))?;

        Ok(TransactionRecord {
            id,
            payer_id,
            payee_id,
            value,
            timestamp,
        })
    }

    async fn fetch_account(
        &self,
        predicate: &str,
        key: &str,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            "SELECT id, document, email, full_name, balance, account_type, version \
             FROM accounts WHERE {predicate} = $1"
        );

        let row: Option<AccountRow> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::map_account).transpose()
    }

    async fn apply_update(
        tx: &mut Transaction<'_, Postgres>,
        update: &BalanceUpdate,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $2, version = version + 1
            WHERE id = $1 AND version = $3
            "#,
        )
        .bind(update.account_id)
        .bind(update.new_balance.value())
        .bind(update.expected_version)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows_affected == 1 {
            return Ok(());
        }

        // find out whether the account is gone or just moved on
        let actual: Option<i64> =
            sqlx::query_scalar("SELECT version FROM accounts WHERE id = $1")
                .bind(update.account_id)
                .fetch_optional(&mut **tx)
                .await?;

        match actual {
            Some(actual) => Err(StoreError::VersionConflict {
                account_id: update.account_id,
                expected: update.expected_version,
                actual,
            }),
            None => Err(StoreError::AccountMissing(update.account_id)),
        }
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, document, email, full_name, balance, account_type, version
            FROM accounts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_account).transpose()
    }

    async fn find_by_key(&self, key: &AccountKey) -> Result<Option<Account>, StoreError> {
        // document first, then email
        if let Some(account) = self.fetch_account("document", key.as_str()).await? {
            return Ok(Some(account));
        }
        self.fetch_account("email", key.as_str()).await
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn commit_transfer(&self, commit: TransferCommit) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        Self::apply_update(&mut tx, &commit.debit).await?;
        Self::apply_update(&mut tx, &commit.credit).await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, payer_id, payee_id, value, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(commit.record.id)
        .bind(commit.record.payer_id)
        .bind(commit.record.payee_id)
        .bind(commit.record.value.value())
        .bind(commit.record.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_participant(
        &self,
        participant: Uuid,
        role: ParticipantRole,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let predicate = match role {
            ParticipantRole::Payer => "payer_id = $1",
            ParticipantRole::Payee => "payee_id = $1",
            ParticipantRole::Either => "(payer_id = $1 OR payee_id = $1)",
        };

        let sql = format!(
            "SELECT id, payer_id, payee_id, value, timestamp \
             FROM transactions \
             WHERE {predicate} AND timestamp >= $2 AND timestamp <= $3 \
             ORDER BY timestamp ASC"
        );

        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(participant)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::map_record).collect()
    }
}

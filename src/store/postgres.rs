//! PostgreSQL storage backend.
//!
//! All writes that belong to one funds transfer run inside one sqlx
//! transaction ([`PgStoreTx`]). Balance changes are expressed as a single
//! `UPDATE ... SET balance = balance + $1 ... RETURNING` statement, so
//! PostgreSQL's row lock is the only coordination mechanism the service
//! relies on: there is no lost-update window between a read and a write,
//! and no in-process locking anywhere.
//!
//! # Isolation
//!
//! Read-committed (the PostgreSQL default) is sufficient: combined with the
//! engine's fixed balance-update order, it rules out the lock-order
//! inversion deadlock between opposing transfers over the same account
//! pair. Stricter levels also work; serialization failures they may raise
//! surface as [`StoreError::Failure`] and are not retried here.

use crate::db::DbPool;
use crate::error::StoreError;
use crate::models::{Account, Entry, Transfer};
use crate::store::{Store, StoreTx};
use async_trait::async_trait;
use sqlx::Postgres;

/// PostgreSQL-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn create_account(
        &self,
        owner: &str,
        currency: &str,
        balance: i64,
    ) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (owner, currency, balance)
            VALUES ($1, $2, $3)
            RETURNING id, owner, balance, currency, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(currency)
        .bind(balance)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn get_account(&self, account_id: i64) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner, balance, currency, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(account)
    }

    async fn get_transfer(&self, transfer_id: i64) -> Result<Transfer, StoreError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at
            FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(transfer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(transfer)
    }

    async fn get_entry(&self, entry_id: i64) -> Result<Entry, StoreError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount, created_at
            FROM entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(entry)
    }

    async fn list_account_entries(&self, account_id: i64) -> Result<Vec<Entry>, StoreError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount, created_at
            FROM entries
            WHERE account_id = $1
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One open PostgreSQL transaction.
///
/// sqlx rolls the underlying transaction back automatically when this is
/// dropped without an explicit commit, which covers the cancellation path:
/// if the calling task is aborted mid-transfer, nothing becomes visible.
pub struct PgStoreTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(transfer)
    }

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (account_id, amount)
            VALUES ($1, $2)
            RETURNING id, account_id, amount, created_at
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        account_id: i64,
        delta: i64,
    ) -> Result<Account, StoreError> {
        // Single-statement increment: the row lock taken here is held until
        // commit, which is what serializes concurrent transfers over the
        // same account.
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $1,
                updated_at = now()
            WHERE id = $2
            RETURNING id, owner, balance, currency, created_at, updated_at
            "#,
        )
        .bind(delta)
        .bind(account_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(account)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

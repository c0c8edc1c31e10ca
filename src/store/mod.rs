//! Storage boundary: the unit-of-work trait and its backends.
//!
//! The transfer engine never talks to a database directly. It is handed a
//! [`Store`], asks it to [`begin`](Store::begin) a unit of work, performs its
//! writes through the returned [`StoreTx`], and finishes with
//! [`commit`](StoreTx::commit) or [`rollback`](StoreTx::rollback). Either
//! every write in the unit of work becomes visible or none does.
//!
//! Two backends implement the boundary:
//!
//! - [`postgres::PgStore`]: the real thing, backed by sqlx transactions
//! - [`memory::MemStore`]: an in-memory store with the same all-or-nothing
//!   contract, used by the test suite and handy for local development
//!
//! Keeping the boundary narrow is what makes the engine storage-agnostic:
//! the coordinator holds an `Arc<dyn Store>` injected at construction time,
//! not a global pool handle.

pub mod memory;
pub mod postgres;

use crate::error::StoreError;
use crate::models::{Account, Entry, Transfer};
use async_trait::async_trait;

/// Handle to the storage backend.
///
/// Point lookups and account creation run in autocommit mode; everything
/// that must be atomic goes through [`Store::begin`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Open one unit of work.
    ///
    /// The returned transaction holds whatever resources the backend needs
    /// (a pooled connection, a state lock) until it is committed, rolled
    /// back, or dropped. Dropping without committing rolls back.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    /// Create a new account with an opening balance.
    async fn create_account(
        &self,
        owner: &str,
        currency: &str,
        balance: i64,
    ) -> Result<Account, StoreError>;

    /// Fetch one account by id.
    async fn get_account(&self, account_id: i64) -> Result<Account, StoreError>;

    /// Fetch one transfer record by id.
    async fn get_transfer(&self, transfer_id: i64) -> Result<Transfer, StoreError>;

    /// Fetch one ledger entry by id.
    async fn get_entry(&self, entry_id: i64) -> Result<Entry, StoreError>;

    /// List all ledger entries recorded against one account, oldest first.
    async fn list_account_entries(&self, account_id: i64) -> Result<Vec<Entry>, StoreError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One open unit of work.
///
/// Exposes the ledger writes (pure inserts) and the account balance
/// increment, all bound to the same transaction. No method here validates
/// business rules. In particular, [`add_account_balance`] never checks the
/// sign of the resulting balance; whether overdrafts are rejected is a
/// policy decision made above the engine.
///
/// [`add_account_balance`]: StoreTx::add_account_balance
#[async_trait]
pub trait StoreTx: Send {
    /// Insert one transfer record. Append-only; never updated or deleted.
    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError>;

    /// Insert one ledger entry. Append-only; never updated or deleted.
    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError>;

    /// Atomically apply `balance += delta` and return the post-update row.
    ///
    /// This must be a single round trip to the store (`balance = balance +
    /// delta` in one statement), never a read followed by a write: two
    /// concurrent increments against the same account must both land even
    /// without any application-level locking.
    async fn add_account_balance(
        &mut self,
        account_id: i64,
        delta: i64,
    ) -> Result<Account, StoreError>;

    /// Make every write in this unit of work visible.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write in this unit of work.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

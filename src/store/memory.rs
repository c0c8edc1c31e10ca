//! In-memory storage backend.
//!
//! A thread-safe store with the same all-or-nothing unit-of-work contract
//! as the PostgreSQL backend, useful for tests and local development. State
//! lives behind an `Arc<tokio::sync::Mutex<..>>`; a unit of work holds the
//! lock from `begin` until it finishes, which gives it serializable
//! isolation: two concurrent transfers never interleave, so the backend can
//! never deadlock and never loses an increment.
//!
//! Rollback is implemented with a snapshot taken at `begin` and restored on
//! `rollback`, or on drop if the unit of work was abandoned without an
//! explicit commit (the cancellation path).

use crate::error::StoreError;
use crate::models::{Account, Entry, Transfer};
use crate::store::{Store, StoreTx};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Everything the store holds. Cloned wholesale for snapshots; the data
/// sets involved in tests are small enough that this is a non-issue.
#[derive(Debug, Clone, Default)]
struct MemState {
    accounts: HashMap<i64, Account>,
    entries: BTreeMap<i64, Entry>,
    transfers: BTreeMap<i64, Transfer>,
    next_account_id: i64,
    next_entry_id: i64,
    next_transfer_id: i64,
}

/// In-memory [`Store`].
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<MemState>>,
    // Account id whose next balance update should fail; 0 = disabled.
    // Account ids start at 1, so 0 is safe as a sentinel.
    fail_balance_update: Arc<AtomicI64>,
}

impl MemStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the next balance update against `account_id` to fail with
    /// [`StoreError::Failure`]. One-shot: the fail point clears itself when
    /// it fires. Lets callers exercise the rollback path of a unit of work
    /// at a point where earlier writes have already succeeded.
    pub fn fail_next_balance_update(&self, account_id: i64) {
        self.fail_balance_update
            .store(account_id, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(MemStoreTx {
            guard,
            snapshot,
            finished: false,
            fail_balance_update: self.fail_balance_update.clone(),
        }))
    }

    async fn create_account(
        &self,
        owner: &str,
        currency: &str,
        balance: i64,
    ) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        state.next_account_id += 1;
        let now = Utc::now();
        let account = Account {
            id: state.next_account_id,
            owner: owner.to_string(),
            balance,
            currency: currency.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, account_id: i64) -> Result<Account, StoreError> {
        let state = self.state.lock().await;
        state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_transfer(&self, transfer_id: i64) -> Result<Transfer, StoreError> {
        let state = self.state.lock().await;
        state
            .transfers
            .get(&transfer_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_entry(&self, entry_id: i64) -> Result<Entry, StoreError> {
        let state = self.state.lock().await;
        state
            .entries
            .get(&entry_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_account_entries(&self, account_id: i64) -> Result<Vec<Entry>, StoreError> {
        let state = self.state.lock().await;
        // BTreeMap iteration order is id order, i.e. oldest first.
        Ok(state
            .entries
            .values()
            .filter(|entry| entry.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// One open unit of work against a [`MemStore`].
///
/// Holds the store lock for its whole lifetime, so its writes are invisible
/// to every other caller until they land, and "landing" is simply keeping
/// them when the lock is released.
pub struct MemStoreTx {
    guard: OwnedMutexGuard<MemState>,
    snapshot: MemState,
    finished: bool,
    fail_balance_update: Arc<AtomicI64>,
}

impl Drop for MemStoreTx {
    fn drop(&mut self) {
        // Abandoned without commit: restore the snapshot, same as rollback.
        if !self.finished {
            *self.guard = std::mem::take(&mut self.snapshot);
        }
    }
}

#[async_trait]
impl StoreTx for MemStoreTx {
    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError> {
        // Mirror the referential constraints of the SQL schema.
        for account_id in [from_account_id, to_account_id] {
            if !self.guard.accounts.contains_key(&account_id) {
                return Err(StoreError::ConstraintViolation(format!(
                    "transfers references missing account {account_id}"
                )));
            }
        }
        if amount <= 0 {
            return Err(StoreError::ConstraintViolation(
                "transfers amount must be positive".to_string(),
            ));
        }

        self.guard.next_transfer_id += 1;
        let transfer = Transfer {
            id: self.guard.next_transfer_id,
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.guard.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError> {
        if !self.guard.accounts.contains_key(&account_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "entries references missing account {account_id}"
            )));
        }

        self.guard.next_entry_id += 1;
        let entry = Entry {
            id: self.guard.next_entry_id,
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.guard.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        account_id: i64,
        delta: i64,
    ) -> Result<Account, StoreError> {
        if self
            .fail_balance_update
            .compare_exchange(account_id, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return Err(StoreError::Failure(format!(
                "injected balance update failure for account {account_id}"
            )));
        }

        let account = self
            .guard
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::NotFound)?;
        account.balance += delta;
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        *self.guard = std::mem::take(&mut self.snapshot);
        self.finished = true;
        Ok(())
    }
}

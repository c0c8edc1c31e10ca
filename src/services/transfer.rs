//! Transfer engine - atomically moves money between two accounts.
//!
//! One transfer produces, inside a single unit of work:
//! - one `Transfer` row
//! - two `Entry` rows (debit against the source, credit against the
//!   destination) keeping the double-entry ledger complete
//! - two atomic balance increments
//!
//! # Atomicity
//!
//! Any error from any step aborts the entire unit of work; no row survives
//! and the error is propagated unchanged to the caller. There are no
//! compensating writes and no automatic retries.
//!
//! # Deadlock Avoidance
//!
//! The two balance updates are always issued in ascending account-id
//! order, regardless of which account is the source. Two concurrent
//! transfers moving money in opposite directions between the same pair of
//! accounts would otherwise take row locks in opposite orders and
//! deadlock; a fixed total order over account ids keeps the wait-for graph
//! acyclic. The entry inserts touch disjoint rows, so their order does not
//! matter.

use crate::error::StoreError;
use crate::models::{Account, Entry, Transfer};
use crate::store::{Store, StoreTx};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input for one funds transfer.
///
/// Preconditions (distinct accounts, positive amount, both accounts exist
/// and share a currency) are the caller's responsibility; handlers enforce
/// them before invoking the engine.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransferParams {
    /// Account the money leaves
    pub from_account_id: i64,

    /// Account the money arrives at
    pub to_account_id: i64,

    /// Amount to move in cents. Must be positive.
    pub amount: i64,
}

/// Everything one committed transfer produced.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    /// The transfer record
    pub transfer: Transfer,

    /// Source account after the debit was applied
    pub from_account: Account,

    /// Destination account after the credit was applied
    pub to_account: Account,

    /// Debit entry (`amount = -transfer.amount`)
    pub from_entry: Entry,

    /// Credit entry (`amount = +transfer.amount`)
    pub to_entry: Entry,
}

/// The transfer engine.
///
/// Holds the storage boundary it was constructed with (dependency
/// injection, not a global pool handle), so it runs unchanged against
/// PostgreSQL in production and the in-memory store in tests.
pub struct TransferService {
    store: Arc<dyn Store>,
}

impl TransferService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Move `amount` from one account to another.
    ///
    /// # Process
    ///
    /// 1. Begin a unit of work
    /// 2. Insert the transfer record
    /// 3. Insert the debit and credit ledger entries
    /// 4. Apply both balance increments, smaller account id first
    /// 5. Commit, or roll back on any error and return it unchanged
    ///
    /// # Errors
    ///
    /// Whatever the store reports: `NotFound` if an account vanished,
    /// `ConstraintViolation` on integrity failures, `Failure` for anything
    /// else. Retrying (e.g. after a serialization failure under strict
    /// isolation) is the caller's decision.
    pub async fn transfer(&self, params: TransferParams) -> Result<TransferResult, StoreError> {
        let mut tx = self.store.begin().await?;

        match Self::apply(tx.as_mut(), params).await {
            Ok(result) => {
                tx.commit().await?;
                tracing::debug!(
                    transfer_id = result.transfer.id,
                    from = params.from_account_id,
                    to = params.to_account_id,
                    amount = params.amount,
                    "transfer committed"
                );
                Ok(result)
            }
            Err(err) => {
                // The original error is what the caller must see; a failed
                // rollback is only worth a log line (the store will discard
                // the transaction when the connection is released anyway).
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// The writes of one transfer, bound to an open unit of work.
    async fn apply(
        tx: &mut dyn StoreTx,
        params: TransferParams,
    ) -> Result<TransferResult, StoreError> {
        let transfer = tx
            .create_transfer(params.from_account_id, params.to_account_id, params.amount)
            .await?;

        let from_entry = tx.create_entry(params.from_account_id, -params.amount).await?;
        let to_entry = tx.create_entry(params.to_account_id, params.amount).await?;

        // Always touch the lower account id first. The direction of the
        // transfer must not influence lock acquisition order.
        let (from_account, to_account) = if params.from_account_id < params.to_account_id {
            let from_account = tx
                .add_account_balance(params.from_account_id, -params.amount)
                .await?;
            let to_account = tx
                .add_account_balance(params.to_account_id, params.amount)
                .await?;
            (from_account, to_account)
        } else {
            let to_account = tx
                .add_account_balance(params.to_account_id, params.amount)
                .await?;
            let from_account = tx
                .add_account_balance(params.from_account_id, -params.amount)
                .await?;
            (from_account, to_account)
        };

        Ok(TransferResult {
            transfer,
            from_account,
            to_account,
            from_entry,
            to_entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    /// Records every write issued against it, in order.
    #[derive(Default)]
    struct RecordingTx {
        calls: Vec<String>,
    }

    #[async_trait]
    impl StoreTx for RecordingTx {
        async fn create_transfer(
            &mut self,
            from_account_id: i64,
            to_account_id: i64,
            amount: i64,
        ) -> Result<Transfer, StoreError> {
            self.calls
                .push(format!("transfer {from_account_id}->{to_account_id}"));
            Ok(Transfer {
                id: 1,
                from_account_id,
                to_account_id,
                amount,
                created_at: Utc::now(),
            })
        }

        async fn create_entry(
            &mut self,
            account_id: i64,
            amount: i64,
        ) -> Result<Entry, StoreError> {
            self.calls.push(format!("entry {account_id} {amount}"));
            Ok(Entry {
                id: 1,
                account_id,
                amount,
                created_at: Utc::now(),
            })
        }

        async fn add_account_balance(
            &mut self,
            account_id: i64,
            delta: i64,
        ) -> Result<Account, StoreError> {
            self.calls.push(format!("balance {account_id}"));
            let now = Utc::now();
            Ok(Account {
                id: account_id,
                owner: "owner".to_string(),
                balance: delta,
                currency: "USD".to_string(),
                created_at: now,
                updated_at: now,
            })
        }

        async fn commit(self: Box<Self>) -> Result<(), StoreError> {
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn balance_updates(tx: &RecordingTx) -> Vec<&str> {
        tx.calls
            .iter()
            .filter(|call| call.starts_with("balance"))
            .map(String::as_str)
            .collect()
    }

    #[tokio::test]
    async fn balance_updates_run_in_ascending_id_order_forward() {
        let mut tx = RecordingTx::default();
        TransferService::apply(
            &mut tx,
            TransferParams {
                from_account_id: 1,
                to_account_id: 2,
                amount: 30,
            },
        )
        .await
        .unwrap();

        assert_eq!(balance_updates(&tx), ["balance 1", "balance 2"]);
    }

    #[tokio::test]
    async fn balance_updates_run_in_ascending_id_order_reverse() {
        let mut tx = RecordingTx::default();
        TransferService::apply(
            &mut tx,
            TransferParams {
                from_account_id: 2,
                to_account_id: 1,
                amount: 30,
            },
        )
        .await
        .unwrap();

        // Same lock order even though the money flows the other way.
        assert_eq!(balance_updates(&tx), ["balance 1", "balance 2"]);
    }

    #[tokio::test]
    async fn writes_happen_in_transfer_entries_balances_order() {
        let mut tx = RecordingTx::default();
        TransferService::apply(
            &mut tx,
            TransferParams {
                from_account_id: 1,
                to_account_id: 2,
                amount: 30,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            tx.calls,
            [
                "transfer 1->2",
                "entry 1 -30",
                "entry 2 30",
                "balance 1",
                "balance 2",
            ]
        );
    }
}

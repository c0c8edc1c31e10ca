//! Transfer engine integration tests.
//!
//! Run against the in-memory store, which enforces the same all-or-nothing
//! unit-of-work contract as the PostgreSQL backend. Concurrency tests spawn
//! real tokio tasks so transfers genuinely race.

use funds_transfer_service::error::StoreError;
use funds_transfer_service::models::Account;
use funds_transfer_service::services::{TransferParams, TransferService};
use funds_transfer_service::store::Store;
use funds_transfer_service::store::memory::MemStore;
use std::collections::HashSet;
use std::sync::Arc;

async fn setup(from_balance: i64, to_balance: i64) -> (MemStore, Arc<TransferService>, Account, Account) {
    let store = MemStore::new();
    let from = store.create_account("alice", "USD", from_balance).await.unwrap();
    let to = store.create_account("bob", "USD", to_balance).await.unwrap();
    let service = Arc::new(TransferService::new(Arc::new(store.clone())));
    (store, service, from, to)
}

#[tokio::test]
async fn transfer_moves_money_and_records_ledger() {
    let (store, service, from, to) = setup(100, 50).await;

    let result = service
        .transfer(TransferParams {
            from_account_id: from.id,
            to_account_id: to.id,
            amount: 30,
        })
        .await
        .unwrap();

    // Transfer record
    assert_eq!(result.transfer.from_account_id, from.id);
    assert_eq!(result.transfer.to_account_id, to.id);
    assert_eq!(result.transfer.amount, 30);
    store.get_transfer(result.transfer.id).await.unwrap();

    // Post-update balances: conservation of the pair total
    assert_eq!(result.from_account.balance, 70);
    assert_eq!(result.to_account.balance, 80);
    assert_eq!(
        result.from_account.balance + result.to_account.balance,
        from.balance + to.balance
    );

    // Ledger entries: one debit, one credit, tied to the right accounts
    assert_eq!(result.from_entry.account_id, from.id);
    assert_eq!(result.from_entry.amount, -30);
    assert_eq!(result.to_entry.account_id, to.id);
    assert_eq!(result.to_entry.amount, 30);
    store.get_entry(result.from_entry.id).await.unwrap();
    store.get_entry(result.to_entry.id).await.unwrap();

    // And the committed state agrees with the returned rows
    assert_eq!(store.get_account(from.id).await.unwrap().balance, 70);
    assert_eq!(store.get_account(to.id).await.unwrap().balance, 80);
    assert_eq!(store.list_account_entries(from.id).await.unwrap().len(), 1);
    assert_eq!(store.list_account_entries(to.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_transfers_same_direction() {
    let n = 5;
    let amount = 10;
    let (store, service, from, to) = setup(100, 50).await;

    let mut handles = Vec::new();
    for _ in 0..n {
        let service = service.clone();
        let params = TransferParams {
            from_account_id: from.id,
            to_account_id: to.id,
            amount,
        };
        handles.push(tokio::spawn(async move { service.transfer(params).await }));
    }

    let mut transfer_ids = HashSet::new();
    let mut entry_ids = HashSet::new();
    let mut seen_multiples = HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();

        assert_eq!(result.transfer.from_account_id, from.id);
        assert_eq!(result.transfer.to_account_id, to.id);
        assert_eq!(result.transfer.amount, amount);
        transfer_ids.insert(result.transfer.id);
        entry_ids.insert(result.from_entry.id);
        entry_ids.insert(result.to_entry.id);

        // Each commit observes a distinct multiple of the amount applied,
        // on both sides of the pair.
        let from_diff = from.balance - result.from_account.balance;
        let to_diff = result.to_account.balance - to.balance;
        assert_eq!(from_diff, to_diff);
        assert!(from_diff > 0);
        assert_eq!(from_diff % amount, 0);

        let k = from_diff / amount;
        assert!(k >= 1 && k <= n);
        assert!(seen_multiples.insert(k), "duplicate multiple {k}");
    }

    // 5 distinct transfers, 10 distinct entries, final balances exact
    assert_eq!(transfer_ids.len(), n as usize);
    assert_eq!(entry_ids.len(), 2 * n as usize);
    assert_eq!(store.get_account(from.id).await.unwrap().balance, 50);
    assert_eq!(store.get_account(to.id).await.unwrap().balance, 100);
}

#[tokio::test]
async fn concurrent_bidirectional_transfers_do_not_deadlock() {
    let n = 10;
    let amount = 10;
    let (store, service, a, b) = setup(100, 100).await;

    let mut handles = Vec::new();
    for i in 0..n {
        // Alternate direction: half A->B, half B->A
        let (from_id, to_id) = if i % 2 == 1 { (b.id, a.id) } else { (a.id, b.id) };
        let service = service.clone();
        let params = TransferParams {
            from_account_id: from_id,
            to_account_id: to_id,
            amount,
        };
        handles.push(tokio::spawn(async move { service.transfer(params).await }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Equal traffic both ways leaves the balances where they started.
    assert_eq!(store.get_account(a.id).await.unwrap().balance, a.balance);
    assert_eq!(store.get_account(b.id).await.unwrap().balance, b.balance);
}

#[tokio::test]
async fn identical_transfers_are_not_deduplicated() {
    let (store, service, from, to) = setup(100, 50).await;
    let params = TransferParams {
        from_account_id: from.id,
        to_account_id: to.id,
        amount: 30,
    };

    let first = service.transfer(params).await.unwrap();
    let second = service.transfer(params).await.unwrap();

    // Two distinct transfer rows, both applied
    assert_ne!(first.transfer.id, second.transfer.id);
    assert_eq!(store.get_account(from.id).await.unwrap().balance, 40);
    assert_eq!(store.get_account(to.id).await.unwrap().balance, 110);
    assert_eq!(store.list_account_entries(from.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn failed_balance_update_rolls_back_everything() {
    let (store, service, from, to) = setup(100, 50).await;

    // Fails on the destination update, i.e. after the transfer row, both
    // entries, and the source balance update have already succeeded.
    store.fail_next_balance_update(to.id);

    let err = service
        .transfer(TransferParams {
            from_account_id: from.id,
            to_account_id: to.id,
            amount: 30,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Failure(_)));

    // Nothing from the failed attempt is visible.
    assert_eq!(store.get_account(from.id).await.unwrap().balance, 100);
    assert_eq!(store.get_account(to.id).await.unwrap().balance, 50);
    assert!(store.list_account_entries(from.id).await.unwrap().is_empty());
    assert!(store.list_account_entries(to.id).await.unwrap().is_empty());

    // The store stays usable afterwards.
    let result = service
        .transfer(TransferParams {
            from_account_id: from.id,
            to_account_id: to.id,
            amount: 30,
        })
        .await
        .unwrap();
    assert_eq!(result.from_account.balance, 70);
    assert_eq!(result.to_account.balance, 80);
}

#[tokio::test]
async fn transfer_to_missing_account_has_no_side_effects() {
    let (store, service, from, _to) = setup(100, 50).await;

    let err = service
        .transfer(TransferParams {
            from_account_id: from.id,
            to_account_id: 999,
            amount: 30,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));

    assert_eq!(store.get_account(from.id).await.unwrap().balance, 100);
    assert!(store.list_account_entries(from.id).await.unwrap().is_empty());
}

//! Ledger entry data model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One signed movement against one account.
///
/// # Database Table
///
/// Maps to the `entries` table. Entries are append-only: they are inserted
/// exactly once and never updated or deleted. Every committed transfer
/// produces exactly two of them: a debit (`amount = -transfer.amount`)
/// against the source account and a credit (`amount = +transfer.amount`)
/// against the destination account.
///
/// An account's balance at any instant equals the sum of all its entry
/// amounts since creation. The service maintains that invariant
/// transactionally instead of recomputing it on read.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Entry {
    /// Unique identifier for this entry
    pub id: i64,

    /// Account this movement applies to
    pub account_id: i64,

    /// Signed amount in cents: negative for debits, positive for credits
    pub amount: i64,

    /// When the entry was recorded
    pub created_at: DateTime<Utc>,
}

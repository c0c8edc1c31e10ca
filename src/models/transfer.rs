//! Transfer record data model and API request type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of one completed movement of funds between two accounts.
///
/// # Database Table
///
/// Maps to the `transfers` table. Like entries, transfer rows are
/// append-only and immutable once created. The amount is always positive
/// (enforced by a CHECK constraint); direction is carried by the
/// from/to account columns.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Transfer {
    /// Unique identifier for this transfer
    pub id: i64,

    /// Account the money left
    pub from_account_id: i64,

    /// Account the money arrived at
    pub to_account_id: i64,

    /// Amount moved, in cents. Always positive.
    pub amount: i64,

    /// When the transfer was committed
    pub created_at: DateTime<Utc>,
}

/// Request to transfer money between two accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_account_id": 1,
///   "to_account_id": 2,
///   "amount": 2500,
///   "currency": "USD"
/// }
/// ```
///
/// # Validation
///
/// The handler checks, before the engine runs:
/// - `amount` is positive
/// - the two accounts are distinct
/// - both accounts exist and hold `currency`
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Account to transfer from (will decrease)
    pub from_account_id: i64,

    /// Account to transfer to (will increase)
    pub to_account_id: i64,

    /// Amount to transfer in cents
    pub amount: i64,

    /// Currency both accounts must hold
    pub currency: String,
}

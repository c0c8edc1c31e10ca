//! Account data model and API request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. Each account holds one balance in one
/// currency.
///
/// # Balance Storage
///
/// Balances are stored as `i64` in the smallest currency unit (cents) to
/// avoid floating-point precision issues.
///
/// For example:
/// - $10.50 is stored as 1050 cents
/// - $100.00 is stored as 10000 cents
///
/// # Mutation Rule
///
/// `balance` is only ever changed through the store's atomic increment
/// (`balance = balance + delta` in a single statement). Nothing in this
/// service reads a balance and writes it back; that pattern loses updates
/// under concurrency.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: i64,

    /// Name of the account holder
    pub owner: String,

    /// Current balance in the smallest currency unit (cents, not dollars)
    pub balance: i64,

    /// Currency code (ISO 4217, 3 letters)
    ///
    /// Examples: "USD", "EUR", "GBP". A transfer is only valid between two
    /// accounts holding the same currency.
    pub currency: String,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of last balance update
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "owner": "alice",
///   "currency": "USD",
///   "initial_balance": 10000
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Name of the account holder
    pub owner: String,

    /// Currency code (defaults to "USD" if not provided)
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Initial balance in cents (defaults to 0 if not provided)
    #[serde(default)]
    pub initial_balance: i64,
}

/// Default currency value when not specified in request.
fn default_currency() -> String {
    "USD".to_string()
}

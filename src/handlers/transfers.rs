//! Transfer HTTP handler.
//!
//! Validates a transfer request and hands it to the transfer engine. All
//! the precondition checks live here, on purpose: by the time the engine
//! runs, the request is known to reference two distinct existing accounts
//! holding the request currency, with a positive amount.

use crate::error::{AppError, StoreError};
use crate::handlers::AppState;
use crate::models::Account;
use crate::models::transfer::TransferRequest;
use crate::services::{TransferParams, TransferResult};
use axum::{Json, extract::State};

/// Execute a funds transfer between two accounts.
///
/// # Endpoint
///
/// `POST /api/v1/transfers`
///
/// # Request Body
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
/// # Response
///
/// - **Success (200 OK)**: Returns the transfer record, both post-update
///   accounts, and both ledger entries
/// - **Error (400)**: Non-positive amount, identical accounts, or a
///   currency mismatch
/// - **Error (404)**: Either account does not exist
/// - **Error (500)**: Storage error (the transfer was rolled back)
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResult>, AppError> {
    if request.amount <= 0 {
        return Err(AppError::InvalidRequest(
            "amount must be positive".to_string(),
        ));
    }

    if request.from_account_id == request.to_account_id {
        return Err(AppError::InvalidRequest(
            "cannot transfer to the same account".to_string(),
        ));
    }

    valid_account(&state, request.from_account_id, &request.currency).await?;
    valid_account(&state, request.to_account_id, &request.currency).await?;

    let result = state
        .transfers
        .transfer(TransferParams {
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount: request.amount,
        })
        .await?;

    Ok(Json(result))
}

/// Check that an account exists and holds the expected currency.
async fn valid_account(
    state: &AppState,
    account_id: i64,
    currency: &str,
) -> Result<Account, AppError> {
    let account = state
        .store
        .get_account(account_id)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => AppError::AccountNotFound,
            other => AppError::Store(other),
        })?;

    if account.currency != currency {
        return Err(AppError::InvalidRequest(format!(
            "account {} holds {}, not {}",
            account_id, account.currency, currency
        )));
    }

    Ok(account)
}

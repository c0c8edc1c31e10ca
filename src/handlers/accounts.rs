//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/v1/accounts - Create new account
//! - GET /api/v1/accounts/{id} - Get account by ID

use crate::error::{AppError, StoreError};
use crate::handlers::AppState;
use crate::models::Account;
use crate::models::account::CreateAccountRequest;
use axum::{
    Json,
    extract::{Path, State},
};

/// Create a new account.
///
/// # Endpoint
///
/// `POST /api/v1/accounts`
///
/// # Request Body
///
/// ```json
/// {
///   "owner": "alice",
///   "currency": "USD",        // optional, defaults to USD
///   "initial_balance": 10000  // optional, defaults to 0
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: Returns the created account
/// - **Error (400)**: Empty owner name
/// - **Error (500)**: Storage error
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    if request.owner.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "owner must not be empty".to_string(),
        ));
    }

    let account = state
        .store
        .create_account(&request.owner, &request.currency, request.initial_balance)
        .await?;

    Ok(Json(account))
}

/// Get a specific account by ID.
///
/// # Endpoint
///
/// `GET /api/v1/accounts/{id}`
///
/// # Response
///
/// - **Success (200 OK)**: Returns account details
/// - **Error (404)**: Account not found
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<Account>, AppError> {
    let account = state
        .store
        .get_account(account_id)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => AppError::AccountNotFound,
            other => AppError::Store(other),
        })?;

    Ok(Json(account))
}

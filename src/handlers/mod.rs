//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Validates it and calls into the store or the transfer engine
//! 3. Returns HTTP response (JSON, status code)

use crate::services::TransferService;
use crate::store::Store;
use std::sync::Arc;

/// Account management endpoints
pub mod accounts;
/// Health check endpoint
pub mod health;
/// Transfer endpoint
pub mod transfers;

/// Shared state handed to every handler.
///
/// Both members point at the same storage backend; the engine gets its own
/// handle because it is constructed with the store injected rather than
/// reaching for a global one.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub transfers: Arc<TransferService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let transfers = Arc::new(TransferService::new(store.clone()));
        Self { store, transfers }
    }
}

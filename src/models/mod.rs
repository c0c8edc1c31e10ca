//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Bank account model
pub mod account;
/// Ledger entry model
pub mod entry;
/// Transfer record model
pub mod transfer;

pub use account::Account;
pub use entry::Entry;
pub use transfer::Transfer;

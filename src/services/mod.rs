//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! The one that matters here is the transfer engine: it owns the unit of
//! work in which a funds movement either fully happens or fully doesn't.

pub mod transfer;

pub use transfer::{TransferParams, TransferResult, TransferService};

//! Funds-transfer service library.
//!
//! The core of this crate is the transfer engine
//! ([`services::TransferService`]): it atomically moves money between two
//! accounts while maintaining a double-entry ledger, delegating all
//! coordination to the storage backend's transactions and applying balance
//! updates in a fixed account-id order so concurrent opposing transfers
//! cannot deadlock.
//!
//! Storage sits behind the [`store::Store`] / [`store::StoreTx`] traits,
//! with a PostgreSQL backend for production and an in-memory backend with
//! the same all-or-nothing contract for tests.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

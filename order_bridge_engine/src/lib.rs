//! # Order bridge engine
//!
//! The storage and sync core of the order bridge. This crate knows nothing about HTTP or the
//! store's wire format; it receives normalized [`sync_types::NewOrderPayload`] values and keeps
//! the back-office ledger consistent with them.
//!
//! The main pieces are:
//! * [`traits::OrderLedgerDatabase`] - the backend contract,
//! * [`sqlite`] - the SQLite implementation of that contract,
//! * [`OrderSyncApi`] - the order upsert / reconcile / cancel workflow,
//! * [`ConnectorApi`] - connector registration and sync bookkeeping.

pub mod db_types;
pub mod sync_types;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

mod sync_api;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use sync_api::{ConnectorApi, OrderSyncApi};

//! Interface contract for ledger database backends.
//!
//! The sync engine only ever talks to storage through [`OrderLedgerDatabase`]. The SQLite backend
//! in [`crate::sqlite`] is the production implementation; the server's endpoint tests mock this
//! trait directly.

mod order_ledger_database;

pub use order_ledger_database::{OrderLedgerDatabase, OrderLedgerError};

//! SQLite backend for the order bridge ledger.

mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;

/// Embedded schema migrations. Run on startup (and against fresh test databases).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

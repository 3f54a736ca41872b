//! # Low-level SQLite database methods
//!
//! All interactions here are simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or create an
//! atomic transaction as the need arises and pass `&mut *tx` without any other changes.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod connectors;
pub mod customers;
pub mod items;
pub mod orders;

const SQLITE_DB_URL: &str = "sqlite://data/order_bridge.db";

pub fn db_url() -> String {
    let result = env::var("OBR_DATABASE_URL").unwrap_or_else(|_| {
        info!("OBR_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// The busy timeout makes a writer queue behind SQLite's single write lock instead of failing
/// straight away when another pooled connection holds it.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

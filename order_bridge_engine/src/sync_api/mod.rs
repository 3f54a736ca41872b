//! High-level APIs over a ledger backend.
//!
//! These are thin orchestration layers: the atomicity guarantees live in the backend, while
//! policy that spans calls (like auto-confirming paid orders) lives here.

mod connector_api;
mod order_sync_api;

pub use connector_api::ConnectorApi;
pub use order_sync_api::OrderSyncApi;

use chrono::{DateTime, Utc};

use crate::{
    db_types::{ConnectorConfig, NewConnectorConfig, SyncStatus},
    traits::{OrderLedgerDatabase, OrderLedgerError},
};

/// Connector bookkeeping: registration, lookup, and per-run sync state.
#[derive(Clone)]
pub struct ConnectorApi<B> {
    db: B,
}

impl<B> ConnectorApi<B>
where B: OrderLedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_connector(&self, id: i64) -> Result<ConnectorConfig, OrderLedgerError> {
        self.db.fetch_connector(id).await?.ok_or(OrderLedgerError::ConnectorNotFound(id))
    }

    pub async fn connector_for_domain(&self, domain: &str) -> Result<Option<ConnectorConfig>, OrderLedgerError> {
        self.db.fetch_active_connector_for_domain(domain).await
    }

    pub async fn auto_import_connectors(&self) -> Result<Vec<ConnectorConfig>, OrderLedgerError> {
        self.db.fetch_auto_import_connectors().await
    }

    pub async fn register_connector(&self, connector: NewConnectorConfig) -> Result<ConnectorConfig, OrderLedgerError> {
        self.db.insert_connector(connector).await
    }

    pub async fn deactivate_connector(&self, id: i64) -> Result<(), OrderLedgerError> {
        self.db.deactivate_connector(id).await
    }

    pub async fn record_sync_result(&self, id: i64, status: SyncStatus, message: &str) -> Result<(), OrderLedgerError> {
        self.db.record_sync_result(id, status, message).await
    }

    pub async fn mark_import_complete(
        &self,
        id: i64,
        imported: i64,
        watermark: DateTime<Utc>,
    ) -> Result<(), OrderLedgerError> {
        self.db.mark_import_complete(id, imported, watermark).await
    }

    pub async fn order_count(&self, connector_id: i64) -> Result<i64, OrderLedgerError> {
        self.db.fetch_order_count(connector_id).await
    }
}

//! `SqliteDatabase` is the concrete SQLite implementation of the order ledger backend.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{connectors, customers, db_url, items, new_pool, orders};
use crate::{
    db_types::{
        ConnectorConfig,
        Customer,
        FinancialStatus,
        FulfillmentStatus,
        Item,
        NewConnectorConfig,
        Order,
        OrderId,
        OrderLine,
        OrderState,
        SyncStatus,
    },
    sqlite::db::orders::NewOrderRecord,
    sync_types::{CancelOutcome, NewOrderPayload, UpsertOutcome},
    traits::{OrderLedgerDatabase, OrderLedgerError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database given by the `OBR_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Opens a transaction that holds SQLite's write lock from the first statement.
    ///
    /// sqlx issues a deferred `BEGIN`, so a transaction that reads before its first write has to
    /// upgrade its read snapshot mid-flight, and that upgrade fails with `SQLITE_BUSY_SNAPSHOT`
    /// once the pool has more than one connection. The no-op `UPDATE` makes the transaction a
    /// writer immediately, the same effect as `BEGIN IMMEDIATE`.
    async fn begin_write(&self) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE connectors SET id = id WHERE 0").execute(&mut *tx).await?;
        Ok(tx)
    }

    /// Reconciles the statuses of an order that is known to exist already.
    async fn reconcile_existing(&self, payload: &NewOrderPayload) -> Result<(Order, UpsertOutcome), OrderLedgerError> {
        let mut tx = self.begin_write().await?;
        let existing = orders::fetch_order_by_shopify_id(&payload.order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderLedgerError::OrderNotFound(payload.order_id.clone()))?;
        let (order, changed) =
            orders::reconcile_statuses(&existing, payload.financial_status, payload.fulfillment_status, &mut tx).await?;
        tx.commit().await?;
        Ok((order, UpsertOutcome::Reconciled { changed }))
    }
}

impl OrderLedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_connector(&self, id: i64) -> Result<Option<ConnectorConfig>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(connectors::fetch_connector(id, &mut conn).await?)
    }

    async fn fetch_active_connector_for_domain(&self, domain: &str) -> Result<Option<ConnectorConfig>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(connectors::fetch_active_by_domain(domain, &mut conn).await?)
    }

    async fn fetch_auto_import_connectors(&self) -> Result<Vec<ConnectorConfig>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(connectors::fetch_auto_import(&mut conn).await?)
    }

    async fn insert_connector(&self, connector: NewConnectorConfig) -> Result<ConnectorConfig, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let connector = connectors::insert_connector(connector, &mut conn).await?;
        info!("🛍️ Connector {} registered for store {}", connector.id, connector.store_url);
        Ok(connector)
    }

    async fn deactivate_connector(&self, id: i64) -> Result<(), OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        connectors::deactivate(id, &mut conn).await
    }

    async fn record_sync_result(&self, id: i64, status: SyncStatus, message: &str) -> Result<(), OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        connectors::record_sync_result(id, status, message, &mut conn).await
    }

    async fn mark_import_complete(
        &self,
        id: i64,
        imported: i64,
        watermark: DateTime<Utc>,
    ) -> Result<(), OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        connectors::mark_import_complete(id, imported, watermark, &mut conn).await
    }

    async fn upsert_order(
        &self,
        connector: &ConnectorConfig,
        payload: &NewOrderPayload,
    ) -> Result<(Order, UpsertOutcome), OrderLedgerError> {
        let mut tx = self.begin_write().await?;
        if let Some(existing) = orders::fetch_order_by_shopify_id(&payload.order_id, &mut tx).await? {
            let (order, changed) =
                orders::reconcile_statuses(&existing, payload.financial_status, payload.fulfillment_status, &mut tx)
                    .await?;
            tx.commit().await?;
            return Ok((order, UpsertOutcome::Reconciled { changed }));
        }
        let customer = customers::resolve_customer(connector, payload, &mut tx).await?;
        let shipping_address_id =
            customers::ensure_delivery_address(&customer, payload.shipping_address.as_ref(), &mut tx).await?;
        let record = NewOrderRecord {
            connector_id: connector.id,
            shopify_order_id: payload.order_id.clone(),
            order_number: payload.order_number.clone(),
            note: payload.note.clone(),
            financial_status: payload.financial_status,
            fulfillment_status: payload.fulfillment_status,
            customer_id: customer.id,
            shipping_address_id,
            created_at: payload.created_at,
        };
        match orders::try_insert_order(record, &mut tx).await? {
            Some(order) => {
                for line in &payload.line_items {
                    let item = items::resolve_item(connector, line, &mut tx).await?;
                    orders::insert_line(
                        order.id,
                        item.id,
                        Some(line.shopify_line_item_id.as_str()),
                        &line.name,
                        line.quantity,
                        line.unit_price,
                        &mut tx,
                    )
                    .await?;
                }
                if !payload.shipping_lines.is_empty() {
                    let shipping = items::shipping_item(&mut tx).await?;
                    for line in &payload.shipping_lines {
                        orders::insert_line(order.id, shipping.id, None, &line.title, 1, line.price, &mut tx).await?;
                    }
                }
                tx.commit().await?;
                debug!("🗃️ Order [{}] created with id {}", order.shopify_order_id, order.id);
                Ok((order, UpsertOutcome::Created))
            },
            None => {
                // Lost a concurrent-create race on the UNIQUE key. Discard our half-built
                // customer and address work and reconcile against the winner instead.
                tx.rollback().await?;
                debug!("🗃️ Order [{}] was created concurrently. Reconciling.", payload.order_id);
                self.reconcile_existing(payload).await
            },
        }
    }

    async fn confirm_order(&self, order_id: i64) -> Result<Order, OrderLedgerError> {
        let mut tx = self.begin_write().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(OrderLedgerError::OrderIdNotFound(order_id))?;
        if order.state != OrderState::Draft {
            return Err(OrderLedgerError::InvalidStateTransition { from: order.state, to: OrderState::Confirmed });
        }
        let order = orders::set_state(order_id, OrderState::Confirmed, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order [{}] confirmed", order.shopify_order_id);
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, OrderLedgerError> {
        let mut tx = self.begin_write().await?;
        let Some(order) = orders::fetch_order_by_shopify_id(order_id, &mut tx).await? else {
            debug!("🗃️ Cancellation for unknown order [{order_id}]. Nothing to do.");
            return Ok(CancelOutcome::NotFound);
        };
        if order.state.is_terminal() {
            debug!("🗃️ Order [{order_id}] is already {}. Keeping its state.", order.state);
        } else {
            orders::set_state(order.id, OrderState::Cancelled, &mut tx).await?;
        }
        // The store's view is recorded regardless of our workflow state.
        let order =
            orders::update_statuses(order.id, FinancialStatus::Voided, FulfillmentStatus::Restocked, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order [{}] cancelled", order.shopify_order_id);
        Ok(CancelOutcome::Cancelled(order))
    }

    async fn fetch_order_by_shopify_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_shopify_id(order_id, &mut conn).await?)
    }

    async fn fetch_lines_for_order(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_lines_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(customers::fetch_customer_by_id(id, &mut conn).await?)
    }

    async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(customers::fetch_customer_by_email(email, &mut conn).await?)
    }

    async fn fetch_item_by_sku(&self, sku: &str) -> Result<Option<Item>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(items::fetch_item_by_sku(sku, &mut conn).await?)
    }

    async fn fetch_order_count(&self, connector_id: i64) -> Result<i64, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::count_for_connector(connector_id, &mut conn).await?)
    }
}

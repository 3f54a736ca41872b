use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{ConnectorConfig, NewConnectorConfig, SyncStatus},
    traits::OrderLedgerError,
};

pub async fn fetch_connector(id: i64, conn: &mut SqliteConnection) -> Result<Option<ConnectorConfig>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM connectors WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// The partial unique index on `(store_url) WHERE is_active = 1` guarantees at most one row here.
pub async fn fetch_active_by_domain(
    domain: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ConnectorConfig>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM connectors WHERE store_url = $1 AND is_active = 1")
        .bind(domain)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_auto_import(conn: &mut SqliteConnection) -> Result<Vec<ConnectorConfig>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM connectors WHERE is_active = 1 AND auto_import_orders = 1 ORDER BY id")
        .fetch_all(conn)
        .await
}

pub async fn insert_connector(
    connector: NewConnectorConfig,
    conn: &mut SqliteConnection,
) -> Result<ConnectorConfig, OrderLedgerError> {
    if fetch_active_by_domain(&connector.store_url, conn).await?.is_some() {
        return Err(OrderLedgerError::DuplicateConnector(connector.store_url));
    }
    let now = Utc::now();
    let result = sqlx::query_as(
        r#"
            INSERT INTO connectors (
                name,
                store_url,
                access_token,
                webhook_secret,
                api_version,
                auto_import_orders,
                import_interval_minutes,
                import_from_date,
                auto_confirm_paid_orders,
                create_customers,
                default_item_id,
                fallback_customer_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, coalesce($5, '2023-10'), $6, coalesce($7, 30), $8, $9, $10, $11, $12, $13, $13)
            RETURNING *;
        "#,
    )
    .bind(connector.name)
    .bind(connector.store_url)
    .bind(connector.access_token.reveal().clone())
    .bind(connector.webhook_secret.map(|s| s.reveal().clone()))
    .bind(connector.api_version)
    .bind(connector.auto_import_orders)
    .bind(connector.import_interval_minutes)
    .bind(connector.import_from_date)
    .bind(connector.auto_confirm_paid_orders)
    .bind(connector.create_customers)
    .bind(connector.default_item_id)
    .bind(connector.fallback_customer_id)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn deactivate(id: i64, conn: &mut SqliteConnection) -> Result<(), OrderLedgerError> {
    let result = sqlx::query("UPDATE connectors SET is_active = 0, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OrderLedgerError::ConnectorNotFound(id));
    }
    debug!("🛍️ Connector {id} deactivated");
    Ok(())
}

pub async fn record_sync_result(
    id: i64,
    status: SyncStatus,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<(), OrderLedgerError> {
    let result =
        sqlx::query("UPDATE connectors SET last_sync_status = $1, last_sync_message = $2, updated_at = $3 WHERE id = $4")
            .bind(status)
            .bind(message)
            .bind(Utc::now())
            .bind(id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(OrderLedgerError::ConnectorNotFound(id));
    }
    Ok(())
}

/// Advances the watermark and the lifetime counter after a completed import run.
pub async fn mark_import_complete(
    id: i64,
    imported: i64,
    watermark: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), OrderLedgerError> {
    let result = sqlx::query(
        r#"
            UPDATE connectors SET
                total_orders_imported = total_orders_imported + $1,
                last_order_import = $2,
                updated_at = $3
            WHERE id = $4
        "#,
    )
    .bind(imported)
    .bind(watermark)
    .bind(Utc::now())
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(OrderLedgerError::ConnectorNotFound(id));
    }
    debug!("🛍️ Connector {id}: watermark advanced to {watermark}, {imported} orders imported");
    Ok(())
}

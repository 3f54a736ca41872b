use chrono::{DateTime, Utc};
use log::debug;
use obr_common::Cents;
use sqlx::SqliteConnection;

use crate::{
    db_types::{FinancialStatus, FulfillmentStatus, Order, OrderId, OrderLine, OrderState},
    traits::OrderLedgerError,
};

/// Everything needed to create a ledger order row. Built inside the upsert transaction once the
/// customer and delivery address have been resolved.
#[derive(Debug, Clone)]
pub struct NewOrderRecord {
    pub connector_id: i64,
    pub shopify_order_id: OrderId,
    pub order_number: String,
    pub note: Option<String>,
    pub financial_status: FinancialStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub customer_id: i64,
    pub shipping_address_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub async fn fetch_order_by_shopify_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE shopify_order_id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Inserts the order row, returning `None` when another connection has inserted the same
/// upstream order id first. The UNIQUE constraint (not a prior existence check) is the
/// authority here.
pub async fn try_insert_order(
    order: NewOrderRecord,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO orders (
                connector_id,
                shopify_order_id,
                order_number,
                note,
                financial_status,
                fulfillment_status,
                customer_id,
                shipping_address_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (shopify_order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.connector_id)
    .bind(order.shopify_order_id)
    .bind(order.order_number)
    .bind(order.note)
    .bind(order.financial_status)
    .bind(order.fulfillment_status)
    .bind(order.customer_id)
    .bind(order.shipping_address_id)
    .bind(order.created_at)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}

pub async fn insert_line(
    order_id: i64,
    item_id: i64,
    shopify_line_item_id: Option<&str>,
    description: &str,
    quantity: i64,
    unit_price: Cents,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_lines (order_id, item_id, shopify_line_item_id, description, quantity, unit_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item_id)
    .bind(shopify_line_item_id)
    .bind(description)
    .bind(quantity)
    .bind(unit_price)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn fetch_lines_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// Writes both store-reported status columns unconditionally.
pub async fn update_statuses(
    order_id: i64,
    financial: FinancialStatus,
    fulfillment: FulfillmentStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderLedgerError> {
    let order = sqlx::query_as(
        "UPDATE orders SET financial_status = $1, fulfillment_status = $2, updated_at = $3 WHERE id = $4 RETURNING *",
    )
    .bind(financial)
    .bind(fulfillment)
    .bind(Utc::now())
    .bind(order_id)
    .fetch_optional(conn)
    .await?
    .ok_or(OrderLedgerError::OrderIdNotFound(order_id))?;
    Ok(order)
}

/// Brings an existing order's status columns in line with what the store reports. A no-op (and
/// no row write) when nothing differs.
pub async fn reconcile_statuses(
    existing: &Order,
    financial: FinancialStatus,
    fulfillment: FulfillmentStatus,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), OrderLedgerError> {
    if existing.financial_status == financial && existing.fulfillment_status == fulfillment {
        return Ok((existing.clone(), false));
    }
    let order = update_statuses(existing.id, financial, fulfillment, conn).await?;
    debug!(
        "🔄️ Order [{}]: statuses reconciled {}/{} -> {}/{}",
        order.shopify_order_id, existing.financial_status, existing.fulfillment_status, financial, fulfillment
    );
    Ok((order, true))
}

pub async fn set_state(order_id: i64, state: OrderState, conn: &mut SqliteConnection) -> Result<Order, OrderLedgerError> {
    let order = sqlx::query_as("UPDATE orders SET state = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(state)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or(OrderLedgerError::OrderIdNotFound(order_id))?;
    Ok(order)
}

pub async fn count_for_connector(connector_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE connector_id = $1").bind(connector_id).fetch_one(conn).await
}

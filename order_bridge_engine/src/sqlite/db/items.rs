use chrono::Utc;
use log::debug;
use obr_common::Cents;
use sqlx::SqliteConnection;

use crate::{
    db_types::{ConnectorConfig, Item},
    sync_types::LineItemPayload,
    traits::OrderLedgerError,
};

/// The singleton service item that every shipping charge is booked against.
pub const SHIPPING_SKU: &str = "SHIPPING";

pub async fn fetch_item_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM items WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_item_by_sku(sku: &str, conn: &mut SqliteConnection) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM items WHERE sku = $1").bind(sku).fetch_optional(conn).await
}

/// Case-insensitive containment match on the item name, oldest record wins. Wildcard characters
/// in the needle are escaped so they match literally.
pub async fn fetch_item_by_name(name: &str, conn: &mut SqliteConnection) -> Result<Option<Item>, sqlx::Error> {
    let escaped = name.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    sqlx::query_as("SELECT * FROM items WHERE name LIKE $1 ESCAPE '\\' AND sellable = 1 ORDER BY id LIMIT 1")
        .bind(format!("%{escaped}%"))
        .fetch_optional(conn)
        .await
}

/// Resolves the ledger item for an order line.
///
/// Match precedence is: sku, then an item whose name contains the line title, then the
/// connector's default item, and as a last resort a new sellable item is created from the line
/// itself.
pub async fn resolve_item(
    connector: &ConnectorConfig,
    line: &LineItemPayload,
    conn: &mut SqliteConnection,
) -> Result<Item, OrderLedgerError> {
    let sku = line.sku.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(sku) = sku {
        if let Some(item) = fetch_item_by_sku(sku, conn).await? {
            return Ok(item);
        }
    }
    let name = line.name.trim();
    if !name.is_empty() {
        if let Some(item) = fetch_item_by_name(name, conn).await? {
            return Ok(item);
        }
    }
    if let Some(id) = connector.default_item_id {
        if let Some(item) = fetch_item_by_id(id, conn).await? {
            return Ok(item);
        }
    }
    if name.is_empty() && sku.is_none() {
        return Err(OrderLedgerError::NoItemAvailable);
    }
    let item = create_item(sku, name, line.unit_price, false, conn).await?;
    debug!("🛍️ Created item {} ({}) for unmatched order line", item.id, item.name);
    Ok(item)
}

/// Fetches (or lazily creates) the shipping service item.
pub async fn shipping_item(conn: &mut SqliteConnection) -> Result<Item, OrderLedgerError> {
    if let Some(item) = fetch_item_by_sku(SHIPPING_SKU, conn).await? {
        return Ok(item);
    }
    let item = create_item(Some(SHIPPING_SKU), "Shipping", Cents::from(0), true, conn).await?;
    Ok(item)
}

/// `ON CONFLICT DO NOTHING` plus a refetch makes this safe against a concurrent insert of the
/// same sku.
async fn create_item(
    sku: Option<&str>,
    name: &str,
    unit_price: Cents,
    is_service: bool,
    conn: &mut SqliteConnection,
) -> Result<Item, OrderLedgerError> {
    let inserted: Option<Item> = sqlx::query_as(
        r#"
            INSERT INTO items (sku, name, unit_price, sellable, is_service, created_at)
            VALUES ($1, $2, $3, 1, $4, $5)
            ON CONFLICT (sku) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(sku)
    .bind(name)
    .bind(unit_price)
    .bind(is_service)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(item) => Ok(item),
        // Another connection created the sku first.
        None => match sku {
            Some(sku) => fetch_item_by_sku(sku, conn).await?.ok_or(OrderLedgerError::NoItemAvailable),
            None => Err(OrderLedgerError::NoItemAvailable),
        },
    }
}

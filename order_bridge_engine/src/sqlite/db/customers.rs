use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Address, ConnectorConfig, Customer},
    sync_types::{AddressPayload, NewOrderPayload},
    traits::OrderLedgerError,
};

pub async fn fetch_customer_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Oldest match wins, so replays keep resolving to the same record.
pub async fn fetch_customer_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE email = $1 COLLATE NOCASE ORDER BY id LIMIT 1")
        .bind(email)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_customer_by_shopify_id(
    shopify_customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE shopify_customer_id = $1 ORDER BY id LIMIT 1")
        .bind(shopify_customer_id)
        .fetch_optional(conn)
        .await
}

/// Resolves the ledger customer for an incoming order.
///
/// Match precedence is: email, then upstream customer id, then (if the connector allows it)
/// create a new record, then the connector's fallback customer. Payloads carrying no usable
/// identity at all go straight to the fallback.
pub async fn resolve_customer(
    connector: &ConnectorConfig,
    payload: &NewOrderPayload,
    conn: &mut SqliteConnection,
) -> Result<Customer, OrderLedgerError> {
    let customer = payload.customer.clone().unwrap_or_default();
    let email = customer
        .email
        .as_deref()
        .or(payload.email.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if let Some(email) = email {
        if let Some(existing) = fetch_customer_by_email(email, conn).await? {
            return Ok(existing);
        }
    }
    if let Some(shopify_id) = customer.shopify_customer_id.as_deref().filter(|s| !s.is_empty()) {
        if let Some(existing) = fetch_customer_by_shopify_id(shopify_id, conn).await? {
            return Ok(existing);
        }
    }
    // Billing name first, then the customer sub-payload's own name (or email).
    let name = payload
        .billing_address
        .as_ref()
        .and_then(|a| a.name.clone())
        .filter(|n| !n.trim().is_empty())
        .or_else(|| customer.display_name());
    if connector.create_customers {
        if let Some(name) = name {
            let created = insert_customer(&customer, &name, email, payload.billing_address.as_ref(), conn).await?;
            debug!("🛍️ Created customer {} ({})", created.id, created.name);
            return Ok(created);
        }
    }
    match connector.fallback_customer_id {
        Some(id) => fetch_customer_by_id(id, conn).await?.ok_or(OrderLedgerError::NoCustomerAvailable),
        None => Err(OrderLedgerError::NoCustomerAvailable),
    }
}

async fn insert_customer(
    customer: &crate::sync_types::CustomerPayload,
    name: &str,
    email: Option<&str>,
    billing: Option<&AddressPayload>,
    conn: &mut SqliteConnection,
) -> Result<Customer, sqlx::Error> {
    let addr = billing.cloned().unwrap_or_default();
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    sqlx::query_as(
        r#"
            INSERT INTO customers (
                shopify_customer_id, name, email, phone,
                street, street2, city, zip, country_code, province_code,
                is_shopify_customer, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1, $11)
            RETURNING *;
        "#,
    )
    .bind(customer.shopify_customer_id.clone())
    .bind(name)
    .bind(email)
    .bind(customer.phone.clone().or_else(|| addr.phone.clone()).unwrap_or_default())
    .bind(field(&addr.street))
    .bind(field(&addr.street2))
    .bind(field(&addr.city))
    .bind(field(&addr.zip))
    .bind(field(&addr.country_code))
    .bind(field(&addr.province_code))
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn fetch_addresses_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Address>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM addresses WHERE customer_id = $1 ORDER BY id")
        .bind(customer_id)
        .fetch_all(conn)
        .await
}

/// Ensures a delivery address record for the order, returning its id.
///
/// No record is created when the order ships to the customer's own address (street, city and zip
/// all match), or when an equivalent delivery address already exists for this customer.
pub async fn ensure_delivery_address(
    customer: &Customer,
    shipping: Option<&AddressPayload>,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, OrderLedgerError> {
    let Some(shipping) = shipping else {
        return Ok(None);
    };
    let customer_location = AddressPayload {
        street: Some(customer.street.clone()),
        city: Some(customer.city.clone()),
        zip: Some(customer.zip.clone()),
        ..Default::default()
    };
    if shipping.same_location(&customer_location) {
        return Ok(None);
    }
    for existing in fetch_addresses_for_customer(customer.id, conn).await? {
        let location = AddressPayload {
            street: Some(existing.street.clone()),
            city: Some(existing.city.clone()),
            zip: Some(existing.zip.clone()),
            ..Default::default()
        };
        if shipping.same_location(&location) {
            return Ok(Some(existing.id));
        }
    }
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    let address: Address = sqlx::query_as(
        r#"
            INSERT INTO addresses (
                customer_id, label, name, street, street2, city, zip, phone, country_code, province_code, created_at
            ) VALUES ($1, 'delivery', $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(customer.id)
    .bind(field(&shipping.name))
    .bind(field(&shipping.street))
    .bind(field(&shipping.street2))
    .bind(field(&shipping.city))
    .bind(field(&shipping.zip))
    .bind(field(&shipping.phone))
    .bind(field(&shipping.country_code))
    .bind(field(&shipping.province_code))
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🛍️ Created delivery address {} for customer {}", address.id, customer.id);
    Ok(Some(address.id))
}

use chrono::{TimeZone, Utc};
use log::*;
use obr_common::Cents;
use order_bridge_engine::{
    db_types::{ConnectorConfig, FinancialStatus, FulfillmentStatus, NewConnectorConfig, OrderId},
    sqlite::MIGRATOR,
    sync_types::{AddressPayload, CustomerPayload, LineItemPayload, NewOrderPayload, ShippingLinePayload},
    traits::OrderLedgerDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn prepare_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = format!("sqlite://order_bridge_test_{}.db", rand::random::<u64>());
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(&url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    MIGRATOR.run(db.pool()).await.expect("Error running migrations");
    db
}

pub async fn register_test_connector(db: &SqliteDatabase) -> ConnectorConfig {
    let mut connector = NewConnectorConfig::new("Test store", "bricks.myshopify.com", "shpat_test_token");
    connector.webhook_secret = Some(obr_common::Secret::new("wh_secret".to_string()));
    db.insert_connector(connector).await.expect("Error registering connector")
}

pub fn jane() -> CustomerPayload {
    CustomerPayload {
        shopify_customer_id: Some("7234598729942".to_string()),
        email: Some("jane.doe@example.com".to_string()),
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        phone: Some("+15555550123".to_string()),
    }
}

pub fn home_address() -> AddressPayload {
    AddressPayload {
        name: Some("Jane Doe".to_string()),
        street: Some("12 Main Street".to_string()),
        street2: None,
        city: Some("Springfield".to_string()),
        zip: Some("62701".to_string()),
        phone: Some("+15555550123".to_string()),
        country_code: Some("US".to_string()),
        province_code: Some("IL".to_string()),
    }
}

pub fn office_address() -> AddressPayload {
    AddressPayload { street: Some("98 Elm Avenue".to_string()), zip: Some("62704".to_string()), ..home_address() }
}

/// A typical paid two-line order with a shipping charge.
pub fn order_payload(id: &str) -> NewOrderPayload {
    NewOrderPayload {
        order_id: OrderId::from(id),
        order_number: format!("#{id}"),
        email: Some("jane.doe@example.com".to_string()),
        note: None,
        created_at: Utc.with_ymd_and_hms(2024, 4, 23, 14, 15, 30).unwrap(),
        financial_status: FinancialStatus::Paid,
        fulfillment_status: FulfillmentStatus::Unfulfilled,
        customer: Some(jane()),
        billing_address: Some(home_address()),
        shipping_address: Some(office_address()),
        line_items: vec![
            LineItemPayload {
                shopify_line_item_id: format!("{id}-1"),
                sku: Some("TS-BLK-M".to_string()),
                name: "Classic Tee - Black / M".to_string(),
                quantity: 2,
                unit_price: Cents::from(2499),
            },
            LineItemPayload {
                shopify_line_item_id: format!("{id}-2"),
                sku: None,
                name: "Sticker Pack".to_string(),
                quantity: 1,
                unit_price: Cents::from(450),
            },
        ],
        shipping_lines: vec![ShippingLinePayload { title: "Standard Shipping".to_string(), price: Cents::from(1000) }],
    }
}

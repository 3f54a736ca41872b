use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use obr_common::Secret;
use order_bridge_engine::{
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
    sync_types::{CancelOutcome, NewOrderPayload, UpsertOutcome},
    traits::{OrderLedgerDatabase, OrderLedgerError},
};

mock! {
    pub LedgerDb {}

    impl Clone for LedgerDb {
        fn clone(&self) -> Self;
    }

    impl OrderLedgerDatabase for LedgerDb {
        fn url(&self) -> &str;
        async fn fetch_connector(&self, id: i64) -> Result<Option<ConnectorConfig>, OrderLedgerError>;
        async fn fetch_active_connector_for_domain(&self, domain: &str) -> Result<Option<ConnectorConfig>, OrderLedgerError>;
        async fn fetch_auto_import_connectors(&self) -> Result<Vec<ConnectorConfig>, OrderLedgerError>;
        async fn insert_connector(&self, connector: NewConnectorConfig) -> Result<ConnectorConfig, OrderLedgerError>;
        async fn deactivate_connector(&self, id: i64) -> Result<(), OrderLedgerError>;
        async fn record_sync_result(&self, id: i64, status: SyncStatus, message: &str) -> Result<(), OrderLedgerError>;
        async fn mark_import_complete(&self, id: i64, imported: i64, watermark: DateTime<Utc>) -> Result<(), OrderLedgerError>;
        async fn upsert_order(&self, connector: &ConnectorConfig, payload: &NewOrderPayload) -> Result<(Order, UpsertOutcome), OrderLedgerError>;
        async fn confirm_order(&self, order_id: i64) -> Result<Order, OrderLedgerError>;
        async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, OrderLedgerError>;
        async fn fetch_order_by_shopify_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderLedgerError>;
        async fn fetch_lines_for_order(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderLedgerError>;
        async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, OrderLedgerError>;
        async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, OrderLedgerError>;
        async fn fetch_item_by_sku(&self, sku: &str) -> Result<Option<Item>, OrderLedgerError>;
        async fn fetch_order_count(&self, connector_id: i64) -> Result<i64, OrderLedgerError>;
    }
}

pub fn test_connector(webhook_secret: Option<&str>) -> ConnectorConfig {
    let now = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    ConnectorConfig {
        id: 1,
        name: "Bricks & Mortar".to_string(),
        store_url: "bricks.myshopify.com".to_string(),
        access_token: Secret::new("shpat_test_token".to_string()),
        webhook_secret: webhook_secret.map(|s| Secret::new(s.to_string())),
        api_version: "2023-10".to_string(),
        is_active: true,
        auto_import_orders: true,
        import_interval_minutes: 30,
        last_order_import: None,
        import_from_date: None,
        auto_confirm_paid_orders: false,
        create_customers: true,
        default_item_id: None,
        fallback_customer_id: None,
        total_orders_imported: 0,
        last_sync_status: None,
        last_sync_message: String::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn test_order(shopify_order_id: &str, state: OrderState) -> Order {
    let now = Utc.with_ymd_and_hms(2024, 4, 23, 14, 15, 30).unwrap();
    Order {
        id: 10,
        connector_id: 1,
        shopify_order_id: OrderId::from(shopify_order_id),
        order_number: "#1001".to_string(),
        note: None,
        financial_status: FinancialStatus::Paid,
        fulfillment_status: FulfillmentStatus::Unfulfilled,
        state,
        is_shopify_order: true,
        customer_id: 5,
        shipping_address_id: None,
        created_at: now,
        updated_at: now,
    }
}

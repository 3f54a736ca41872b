use std::fmt::Display;

use chrono::{DateTime, Utc};
use obr_common::Secret;
use order_bridge_engine::db_types::{ConnectorConfig, NewConnectorConfig, SyncStatus};
use serde::{Deserialize, Serialize};
use shopify_client::normalize_store_url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

fn default_true() -> bool {
    true
}

/// Request body for registering a new connector.
#[derive(Debug, Clone, Deserialize)]
pub struct NewConnectorRequest {
    pub name: String,
    pub store_url: String,
    pub access_token: String,
    pub webhook_secret: Option<String>,
    pub api_version: Option<String>,
    #[serde(default = "default_true")]
    pub auto_import_orders: bool,
    pub import_interval_minutes: Option<i64>,
    pub import_from_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub auto_confirm_paid_orders: bool,
    #[serde(default = "default_true")]
    pub create_customers: bool,
    pub default_item_id: Option<i64>,
    pub fallback_customer_id: Option<i64>,
}

impl From<NewConnectorRequest> for NewConnectorConfig {
    fn from(req: NewConnectorRequest) -> Self {
        Self {
            name: req.name,
            store_url: normalize_store_url(&req.store_url),
            access_token: Secret::new(req.access_token),
            webhook_secret: req.webhook_secret.filter(|s| !s.is_empty()).map(Secret::new),
            api_version: req.api_version,
            auto_import_orders: req.auto_import_orders,
            import_interval_minutes: req.import_interval_minutes,
            import_from_date: req.import_from_date,
            auto_confirm_paid_orders: req.auto_confirm_paid_orders,
            create_customers: req.create_customers,
            default_item_id: req.default_item_id,
            fallback_customer_id: req.fallback_customer_id,
        }
    }
}

/// Connector details as exposed over the API. Credentials never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorInfo {
    pub id: i64,
    pub name: String,
    pub store_url: String,
    pub api_version: String,
    pub is_active: bool,
    pub auto_import_orders: bool,
    pub import_interval_minutes: i64,
    pub last_order_import: Option<DateTime<Utc>>,
    pub auto_confirm_paid_orders: bool,
    pub create_customers: bool,
    pub total_orders_imported: i64,
    pub last_sync_status: Option<SyncStatus>,
    pub last_sync_message: String,
}

impl From<ConnectorConfig> for ConnectorInfo {
    fn from(c: ConnectorConfig) -> Self {
        Self {
            id: c.id,
            name: c.name,
            store_url: c.store_url,
            api_version: c.api_version,
            is_active: c.is_active,
            auto_import_orders: c.auto_import_orders,
            import_interval_minutes: c.import_interval_minutes,
            last_order_import: c.last_order_import,
            auto_confirm_paid_orders: c.auto_confirm_paid_orders,
            create_customers: c.create_customers,
            total_orders_imported: c.total_orders_imported,
            last_sync_status: c.last_sync_status,
            last_sync_message: c.last_sync_message,
        }
    }
}

/// Result of a connection test against the upstream store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub shop_name: Option<String>,
    pub shop_domain: Option<String>,
    pub message: String,
}

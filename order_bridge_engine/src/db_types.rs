use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use obr_common::{Cents, Secret};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Unsupported status value: {0}")]
pub struct StatusConversionError(pub String);

/// The upstream (Shopify) order id. Stored as an opaque string and used as the idempotency key
/// for every sync operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Payment status as reported by the store, normalized to a closed set of tokens.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FinancialStatus {
    #[default]
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
}

impl FinancialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
            Self::Voided => "voided",
        }
    }
}

impl Display for FinancialStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinancialStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "authorized" => Ok(Self::Authorized),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            "refunded" => Ok(Self::Refunded),
            "voided" => Ok(Self::Voided),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

/// Shipping status. Stores report "not shipped yet" as an absent value; that absence is
/// normalized to [`FulfillmentStatus::Unfulfilled`] before it reaches the ledger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    Partial,
    Fulfilled,
    Restocked,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unfulfilled => "unfulfilled",
            Self::Partial => "partial",
            Self::Fulfilled => "fulfilled",
            Self::Restocked => "restocked",
        }
    }
}

impl Display for FulfillmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfulfilled" | "null" => Ok(Self::Unfulfilled),
            "partial" => Ok(Self::Partial),
            "fulfilled" => Ok(Self::Fulfilled),
            "restocked" => Ok(Self::Restocked),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

/// Lifecycle state of an order in the back-office ledger. This is *our* workflow state, distinct
/// from the statuses the store reports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    Draft,
    Confirmed,
    Done,
    Cancelled,
}

impl OrderState {
    /// Terminal orders are never moved by the sync engine. Status columns may still be refreshed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

/// Outcome of the last sync run for a connector, recorded for operator visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Error,
    Pending,
}

impl Display for SyncStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Pending => "pending",
        };
        f.write_str(s)
    }
}

//--------------------------------------     Order      ---------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub connector_id: i64,
    pub shopify_order_id: OrderId,
    pub order_number: String,
    pub note: Option<String>,
    pub financial_status: FinancialStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub state: OrderState,
    pub is_shopify_order: bool,
    pub customer_id: i64,
    pub shipping_address_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub shopify_line_item_id: Option<String>,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Cents,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    Customer    ---------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub shopify_customer_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub zip: String,
    pub country_code: String,
    pub province_code: String,
    pub is_shopify_customer: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub customer_id: i64,
    pub label: String,
    pub name: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub zip: String,
    pub phone: String,
    pub country_code: String,
    pub province_code: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Item      ---------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub sku: Option<String>,
    pub name: String,
    pub unit_price: Cents,
    pub sellable: bool,
    pub is_service: bool,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   Connector    ---------------------------------------

/// A configured link between one Shopify store and the ledger. The access token and webhook
/// secret are wrapped in [`Secret`] so they never leak through Debug or log output.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub id: i64,
    pub name: String,
    pub store_url: String,
    pub access_token: Secret<String>,
    pub webhook_secret: Option<Secret<String>>,
    pub api_version: String,
    pub is_active: bool,
    pub auto_import_orders: bool,
    pub import_interval_minutes: i64,
    pub last_order_import: Option<DateTime<Utc>>,
    pub import_from_date: Option<DateTime<Utc>>,
    pub auto_confirm_paid_orders: bool,
    pub create_customers: bool,
    pub default_item_id: Option<i64>,
    pub fallback_customer_id: Option<i64>,
    pub total_orders_imported: i64,
    pub last_sync_status: Option<SyncStatus>,
    pub last_sync_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, sqlx::sqlite::SqliteRow> for ConnectorConfig {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            store_url: row.try_get("store_url")?,
            access_token: Secret::new(row.try_get::<String, _>("access_token")?),
            webhook_secret: row.try_get::<Option<String>, _>("webhook_secret")?.map(Secret::new),
            api_version: row.try_get("api_version")?,
            is_active: row.try_get("is_active")?,
            auto_import_orders: row.try_get("auto_import_orders")?,
            import_interval_minutes: row.try_get("import_interval_minutes")?,
            last_order_import: row.try_get("last_order_import")?,
            import_from_date: row.try_get("import_from_date")?,
            auto_confirm_paid_orders: row.try_get("auto_confirm_paid_orders")?,
            create_customers: row.try_get("create_customers")?,
            default_item_id: row.try_get("default_item_id")?,
            fallback_customer_id: row.try_get("fallback_customer_id")?,
            total_orders_imported: row.try_get("total_orders_imported")?,
            last_sync_status: row.try_get("last_sync_status")?,
            last_sync_message: row.try_get("last_sync_message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Parameters for registering a new connector. Everything not given here takes the schema
/// default (active, auto-import on, 30 minute interval, auto-confirm on, customer creation on).
#[derive(Debug, Clone)]
pub struct NewConnectorConfig {
    pub name: String,
    pub store_url: String,
    pub access_token: Secret<String>,
    pub webhook_secret: Option<Secret<String>>,
    pub api_version: Option<String>,
    pub auto_import_orders: bool,
    pub import_interval_minutes: Option<i64>,
    pub import_from_date: Option<DateTime<Utc>>,
    pub auto_confirm_paid_orders: bool,
    pub create_customers: bool,
    pub default_item_id: Option<i64>,
    pub fallback_customer_id: Option<i64>,
}

impl NewConnectorConfig {
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(name: S1, store_url: S2, access_token: S3) -> Self {
        Self {
            name: name.into(),
            store_url: store_url.into(),
            access_token: Secret::new(access_token.into()),
            webhook_secret: None,
            api_version: None,
            auto_import_orders: true,
            import_interval_minutes: None,
            import_from_date: None,
            auto_confirm_paid_orders: true,
            create_customers: true,
            default_item_id: None,
            fallback_customer_id: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in ["pending", "authorized", "partially_paid", "paid", "partially_refunded", "refunded", "voided"] {
            let status = s.parse::<FinancialStatus>().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("money_please".parse::<FinancialStatus>().is_err());
    }

    #[test]
    fn absent_fulfillment_is_unfulfilled() {
        assert_eq!(FulfillmentStatus::default(), FulfillmentStatus::Unfulfilled);
        assert_eq!("null".parse::<FulfillmentStatus>().unwrap(), FulfillmentStatus::Unfulfilled);
    }

    #[test]
    fn terminal_states() {
        assert!(!OrderState::Draft.is_terminal());
        assert!(!OrderState::Confirmed.is_terminal());
        assert!(OrderState::Done.is_terminal());
        assert!(OrderState::Cancelled.is_terminal());
    }
}

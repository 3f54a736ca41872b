use serde::{Deserialize, Serialize};

/// An order as Shopify delivers it, both in webhook bodies and in the REST orders collection.
/// Only the fields the bridge consumes are modelled; everything else is ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyOrder {
    pub id: i64,
    /// The human-readable order number, e.g. "#1001".
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
    /// pending, authorized, partially_paid, paid, partially_refunded, refunded or voided.
    pub financial_status: Option<String>,
    /// fulfilled, partial, restocked — or JSON null for unfulfilled orders.
    pub fulfillment_status: Option<String>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub total_price: String,
    pub customer: Option<ShopifyCustomer>,
    pub billing_address: Option<ShopifyAddress>,
    pub shipping_address: Option<ShopifyAddress>,
    #[serde(default)]
    pub line_items: Vec<ShopifyLineItem>,
    #[serde(default)]
    pub shipping_lines: Vec<ShopifyShippingLine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopifyCustomer {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopifyAddress {
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub province_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyLineItem {
    pub id: i64,
    pub sku: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyShippingLine {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
}

fn default_quantity() -> i64 {
    1
}

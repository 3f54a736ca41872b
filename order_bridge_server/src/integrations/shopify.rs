//! Conversion between Shopify's wire format and the engine's normalized payloads, plus webhook
//! topic classification.

use chrono::{DateTime, Utc};
use log::*;
use obr_common::Cents;
use order_bridge_engine::{
    db_types::{FinancialStatus, FulfillmentStatus, OrderId},
    sync_types::{AddressPayload, CustomerPayload, LineItemPayload, NewOrderPayload, ShippingLinePayload},
};
use shopify_client::{helpers::parse_shopify_price, ShopifyAddress, ShopifyOrder};
use thiserror::Error;

/// The webhook topic header, mapped to what the bridge should do with the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    UpsertOrder,
    CancelOrder,
    Ignored,
}

impl WebhookEvent {
    pub fn classify(topic: &str) -> Self {
        match topic {
            "orders/create" | "orders/updated" | "orders/paid" => Self::UpsertOrder,
            "orders/cancelled" => Self::CancelOrder,
            _ => Self::Ignored,
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderConversionError {
    #[error("The Shopify order contained invalid data. {0}")]
    FormatError(String),
    #[error("Order line {0} has a negative quantity ({1})")]
    NegativeQuantity(i64, i64),
}

fn address_payload(addr: &ShopifyAddress) -> AddressPayload {
    AddressPayload {
        name: addr.name.clone(),
        street: addr.address1.clone(),
        street2: addr.address2.clone(),
        city: addr.city.clone(),
        zip: addr.zip.clone(),
        phone: addr.phone.clone(),
        country_code: addr.country_code.clone(),
        province_code: addr.province_code.clone(),
    }
}

/// Normalizes a Shopify order into the payload the sync engine consumes.
///
/// An absent fulfillment status (JSON null) is Shopify's way of saying "unfulfilled" and is
/// mapped accordingly. Prices are converted from decimal strings to cents here, at the boundary.
pub fn order_payload_from_shopify(order: ShopifyOrder) -> Result<NewOrderPayload, OrderConversionError> {
    trace!("Converting ShopifyOrder {} to a sync payload", order.id);
    let created_at = order
        .created_at
        .parse::<DateTime<Utc>>()
        .map_err(|e| OrderConversionError::FormatError(format!("Invalid created_at '{}'. {e}", order.created_at)))?;
    let financial_status = match order.financial_status.as_deref() {
        None => FinancialStatus::default(),
        Some(s) => s.parse::<FinancialStatus>().map_err(|e| OrderConversionError::FormatError(e.to_string()))?,
    };
    let fulfillment_status = order
        .fulfillment_status
        .as_deref()
        .unwrap_or("unfulfilled")
        .parse::<FulfillmentStatus>()
        .map_err(|e| OrderConversionError::FormatError(e.to_string()))?;
    let customer = order.customer.as_ref().map(|c| CustomerPayload {
        shopify_customer_id: c.id.map(|id| id.to_string()),
        email: c.email.clone(),
        first_name: c.first_name.clone(),
        last_name: c.last_name.clone(),
        phone: c.phone.clone(),
    });
    let mut line_items = Vec::with_capacity(order.line_items.len());
    for line in &order.line_items {
        if line.quantity < 0 {
            return Err(OrderConversionError::NegativeQuantity(line.id, line.quantity));
        }
        let unit_price = price_in_cents(&line.price)?;
        line_items.push(LineItemPayload {
            shopify_line_item_id: line.id.to_string(),
            sku: line.sku.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price,
        });
    }
    let mut shipping_lines = Vec::with_capacity(order.shipping_lines.len());
    for line in &order.shipping_lines {
        shipping_lines.push(ShippingLinePayload { title: line.title.clone(), price: price_in_cents(&line.price)? });
    }
    Ok(NewOrderPayload {
        order_id: OrderId(order.id.to_string()),
        order_number: order.name,
        email: order.email,
        note: order.note,
        created_at,
        financial_status,
        fulfillment_status,
        customer,
        billing_address: order.billing_address.as_ref().map(address_payload),
        shipping_address: order.shipping_address.as_ref().map(address_payload),
        line_items,
        shipping_lines,
    })
}

fn price_in_cents(price: &str) -> Result<Cents, OrderConversionError> {
    if price.trim().is_empty() {
        return Ok(Cents::from(0));
    }
    parse_shopify_price(price).map_err(|e| OrderConversionError::FormatError(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classify_topics() {
        assert_eq!(WebhookEvent::classify("orders/create"), WebhookEvent::UpsertOrder);
        assert_eq!(WebhookEvent::classify("orders/updated"), WebhookEvent::UpsertOrder);
        assert_eq!(WebhookEvent::classify("orders/paid"), WebhookEvent::UpsertOrder);
        assert_eq!(WebhookEvent::classify("orders/cancelled"), WebhookEvent::CancelOrder);
        assert_eq!(WebhookEvent::classify("products/update"), WebhookEvent::Ignored);
        assert_eq!(WebhookEvent::classify(""), WebhookEvent::Ignored);
    }

    #[test]
    fn convert_full_order() {
        let json = include_str!("../../../shopify_client/src/test_assets/order1.json");
        let order: ShopifyOrder = serde_json::from_str(json).unwrap();
        let payload = order_payload_from_shopify(order).unwrap();
        assert_eq!(payload.order_id, OrderId::from("5875167887638"));
        assert_eq!(payload.order_number, "#1001");
        assert_eq!(payload.financial_status, FinancialStatus::Paid);
        assert_eq!(payload.fulfillment_status, FulfillmentStatus::Unfulfilled);
        assert_eq!(payload.line_items.len(), 2);
        assert_eq!(payload.line_items[0].unit_price, Cents::from(2499));
        assert_eq!(payload.shipping_lines[0].price, Cents::from(1000));
        let customer = payload.customer.unwrap();
        assert_eq!(customer.shopify_customer_id.as_deref(), Some("7234598729942"));
        assert!(payload.shipping_address.is_some());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let json = r#"{
            "id": 42,
            "created_at": "2024-05-01T18:08:00Z",
            "line_items": [{"id": 1, "sku": "X", "name": "Thing", "quantity": -1, "price": "1.00"}]
        }"#;
        let order: ShopifyOrder = serde_json::from_str(json).unwrap();
        let err = order_payload_from_shopify(order).unwrap_err();
        assert!(matches!(err, OrderConversionError::NegativeQuantity(1, -1)));
    }

    #[test]
    fn bad_timestamp_is_a_format_error() {
        let json = r#"{"id": 42, "created_at": "yesterday-ish"}"#;
        let order: ShopifyOrder = serde_json::from_str(json).unwrap();
        assert!(matches!(order_payload_from_shopify(order), Err(OrderConversionError::FormatError(_))));
    }
}

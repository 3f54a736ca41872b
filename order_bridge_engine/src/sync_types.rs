//! Normalized order payloads, as handed to the sync engine.
//!
//! Webhook deliveries and bulk-import pages arrive in the store's wire format; the server
//! converts them into these structures before anything touches the ledger. The engine itself
//! never parses upstream JSON.

use chrono::{DateTime, Utc};
use obr_common::Cents;
use serde::{Deserialize, Serialize};

use crate::db_types::{FinancialStatus, FulfillmentStatus, Order, OrderId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderPayload {
    pub order_id: OrderId,
    pub order_number: String,
    pub email: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub financial_status: FinancialStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub customer: Option<CustomerPayload>,
    pub billing_address: Option<AddressPayload>,
    pub shipping_address: Option<AddressPayload>,
    pub line_items: Vec<LineItemPayload>,
    pub shipping_lines: Vec<ShippingLinePayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerPayload {
    pub shopify_customer_id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl CustomerPayload {
    /// "First Last", falling back to whichever half is present, or the email as a last resort.
    pub fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return Some(name);
        }
        self.email.clone().filter(|e| !e.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPayload {
    pub name: Option<String>,
    pub street: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub province_code: Option<String>,
}

impl AddressPayload {
    /// Two addresses are "the same place" when street, city and zip all match. Name or phone
    /// differences alone do not warrant a second address record.
    pub fn same_location(&self, other: &AddressPayload) -> bool {
        let norm = |s: &Option<String>| s.as_deref().unwrap_or("").trim().to_lowercase();
        norm(&self.street) == norm(&other.street) && norm(&self.city) == norm(&other.city) && norm(&self.zip) == norm(&other.zip)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemPayload {
    pub shopify_line_item_id: String,
    pub sku: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingLinePayload {
    pub title: String,
    pub price: Cents,
}

/// What the upsert engine did with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No ledger order with this id existed; a full order was created.
    Created,
    /// An order already existed. `changed` is true when at least one status column was updated.
    Reconciled { changed: bool },
}

/// Result of a cancellation request.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled(Order),
    /// Cancelling an order we never imported is a no-op, not an error.
    NotFound,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_name_prefers_names_over_email() {
        let c = CustomerPayload {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            email: Some("jane@example.com".into()),
            ..Default::default()
        };
        assert_eq!(c.display_name().unwrap(), "Jane Doe");
        let c = CustomerPayload { email: Some("jane@example.com".into()), ..Default::default() };
        assert_eq!(c.display_name().unwrap(), "jane@example.com");
        let c = CustomerPayload::default();
        assert!(c.display_name().is_none());
    }

    #[test]
    fn same_location_ignores_name_and_case() {
        let a = AddressPayload {
            name: Some("Jane Doe".into()),
            street: Some("12 Main Street".into()),
            city: Some("Springfield".into()),
            zip: Some("62701".into()),
            ..Default::default()
        };
        let mut b = a.clone();
        b.name = Some("J. Doe".into());
        b.city = Some("SPRINGFIELD".into());
        assert!(a.same_location(&b));
        b.street = Some("98 Elm Avenue".into());
        assert!(!a.same_location(&b));
    }
}

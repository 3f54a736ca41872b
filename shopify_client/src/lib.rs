//! A thin, typed client for the Shopify Admin REST API.
//!
//! The client covers the slice of the API that the order bridge needs: fetching shop metadata
//! (connection tests), and draining the orders collection page by page using Shopify's
//! `Link`-header cursor pagination. Authentication uses a static per-store access token header.

mod api;
mod config;
mod error;
mod order;
mod shop;

pub mod helpers;

pub use api::{OrderPage, OrderPageFilter, ShopifyApi, ORDERS_PAGE_LIMIT};
pub use config::{normalize_store_url, ShopifyConfig};
pub use error::ShopifyApiError;
pub use order::{ShopifyAddress, ShopifyCustomer, ShopifyLineItem, ShopifyOrder, ShopifyShippingLine};
pub use shop::ShopifyShop;

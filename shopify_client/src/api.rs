use std::{sync::Arc, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, LINK},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::ShopifyConfig, helpers::next_page_cursor, ShopifyApiError, ShopifyOrder, ShopifyShop};

/// Orders are fetched in pages of 250, the API maximum, to minimize round-trips.
pub const ORDERS_PAGE_LIMIT: u32 = 250;

/// Every outbound call carries a bounded timeout so a hung upstream cannot hang an import run.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ShopifyApi {
    config: ShopifyConfig,
    client: Arc<Client>,
}

/// Date filters for the first page of an orders fetch. Once the upstream hands back a pagination
/// cursor, these must not be reapplied; the cursor alone identifies subsequent pages.
#[derive(Debug, Clone, Default)]
pub struct OrderPageFilter {
    pub created_at_min: Option<DateTime<Utc>>,
    pub updated_at_min: Option<DateTime<Utc>>,
}

/// One page of orders plus the opaque cursor for the next page, if any.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<ShopifyOrder>,
    pub next_cursor: Option<String>,
}

impl ShopifyApi {
    pub fn new(config: ShopifyConfig) -> Result<Self, ShopifyApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.access_token.reveal().as_str())
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        headers.insert("X-Shopify-Access-Token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn shop_domain(&self) -> &str {
        &self.config.shop
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}/admin/api/{}{path}", self.config.shop, self.config.api_version)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, ShopifyApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
            Err(ShopifyApiError::QueryError { status, message })
        }
    }

    /// Fetches the shop record. Primarily used as a connection test for freshly configured stores.
    pub async fn get_shop(&self) -> Result<ShopifyShop, ShopifyApiError> {
        #[derive(Deserialize)]
        struct ShopResponse {
            shop: ShopifyShop,
        }
        debug!("Fetching shop info for {}", self.config.shop);
        let result = self.rest_query::<ShopResponse, ()>(Method::GET, "/shop.json", &[], None).await?;
        Ok(result.shop)
    }

    /// Fetches a single order by its id.
    pub async fn get_order(&self, order_id: u64) -> Result<ShopifyOrder, ShopifyApiError> {
        #[derive(Deserialize)]
        struct OrderResponse {
            order: ShopifyOrder,
        }
        let path = format!("/orders/{order_id}.json");
        debug!("Fetching order #{order_id}");
        let result = self.rest_query::<OrderResponse, ()>(Method::GET, &path, &[], None).await?;
        Ok(result.order)
    }

    /// Fetches the first page of an orders run, applying the given date filters.
    pub async fn orders_first_page(&self, filter: &OrderPageFilter) -> Result<OrderPage, ShopifyApiError> {
        let limit = ORDERS_PAGE_LIMIT.to_string();
        let mut params: Vec<(&str, String)> = vec![("status", "any".into()), ("limit", limit)];
        if let Some(created_min) = filter.created_at_min {
            params.push(("created_at_min", created_min.to_rfc3339_opts(SecondsFormat::Secs, true)));
        } else if let Some(updated_min) = filter.updated_at_min {
            params.push(("updated_at_min", updated_min.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let params = params.iter().map(|(k, v)| (*k, v.as_str())).collect::<Vec<_>>();
        self.orders_page(&params).await
    }

    /// Fetches a subsequent page using only the opaque cursor from the previous page's response.
    pub async fn orders_next_page(&self, cursor: &str) -> Result<OrderPage, ShopifyApiError> {
        let limit = ORDERS_PAGE_LIMIT.to_string();
        let params = [("limit", limit.as_str()), ("page_info", cursor)];
        self.orders_page(&params).await
    }

    async fn orders_page(&self, params: &[(&str, &str)]) -> Result<OrderPage, ShopifyApiError> {
        #[derive(Deserialize)]
        struct OrdersResponse {
            orders: Vec<ShopifyOrder>,
        }
        let url = self.url("/orders.json");
        trace!("Fetching orders page: {url}");
        let response = self
            .client
            .request(Method::GET, url)
            .query(params)
            .send()
            .await
            .map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
            return Err(ShopifyApiError::QueryError { status, message });
        }
        // The cursor lives in the Link response header, not in the body.
        let next_cursor = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_cursor);
        let body = response.json::<OrdersResponse>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        debug!("Fetched a page of {} orders. More pages: {}", body.orders.len(), next_cursor.is_some());
        Ok(OrderPage { orders: body.orders, next_cursor })
    }
}

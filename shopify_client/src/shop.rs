use serde::{Deserialize, Serialize};

/// Shop metadata from `GET /shop.json`. Used for connection tests when a connector is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopifyShop {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub domain: String,
    pub plan_name: Option<String>,
    pub timezone: Option<String>,
}

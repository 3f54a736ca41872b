use obr_common::Secret;

pub const DEFAULT_API_VERSION: &str = "2023-10";
const CANONICAL_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Connection settings for a single Shopify store. These come from the connector record, not from
/// the environment: the bridge can serve several stores at once.
#[derive(Debug, Clone, Default)]
pub struct ShopifyConfig {
    /// The store domain, e.g. "my-shop.myshopify.com"
    pub shop: String,
    pub access_token: Secret<String>,
    pub api_version: String,
}

impl ShopifyConfig {
    pub fn new(shop: &str, access_token: Secret<String>, api_version: &str) -> Self {
        let api_version = if api_version.is_empty() { DEFAULT_API_VERSION } else { api_version };
        Self { shop: normalize_store_url(shop), access_token, api_version: api_version.into() }
    }
}

/// Normalizes a user-supplied store URL: trimmed, lowercased, and suffixed with the canonical
/// `.myshopify.com` domain if the value contains no dot at all.
pub fn normalize_store_url(url: &str) -> String {
    let url = url.trim().to_lowercase();
    if url.contains('.') {
        url
    } else {
        format!("{url}{CANONICAL_DOMAIN_SUFFIX}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn store_url_normalization() {
        assert_eq!(normalize_store_url("MyStore"), "mystore.myshopify.com");
        assert_eq!(normalize_store_url("  mystore.myshopify.com "), "mystore.myshopify.com");
        assert_eq!(normalize_store_url("shop.example.com"), "shop.example.com");
        assert_eq!(normalize_store_url("MYSTORE.MYSHOPIFY.COM"), "mystore.myshopify.com");
    }
}

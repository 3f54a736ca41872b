use obr_common::Cents;
use regex::Regex;

use crate::ShopifyApiError;

/// Shopify expresses prices as decimal strings ("6.00").
pub fn parse_shopify_price(price: &str) -> Result<Cents, ShopifyApiError> {
    Cents::parse(price).map_err(|e| ShopifyApiError::InvalidCurrencyAmount(e.to_string()))
}

/// Extracts the opaque `page_info` cursor from a `Link` response header, if the header advertises
/// a `rel="next"` page. Shopify's cursor pagination is stateful: once a cursor exists, subsequent
/// requests must carry only the cursor, with no other filter parameters.
pub fn next_page_cursor(link_header: &str) -> Option<String> {
    if !link_header.contains("rel=\"next\"") {
        return None;
    }
    // The header looks like: <https://…/orders.json?page_info=abc123&limit=250>; rel="next"
    let re = Regex::new(r#"<[^>]*[?&]page_info=([^&>]+)[^>]*>;\s*rel="next""#).ok()?;
    re.captures(link_header).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extracts_next_cursor() {
        let header = r#"<https://x.myshopify.com/admin/api/2023-10/orders.json?page_info=abc123&limit=250>; rel="next""#;
        assert_eq!(next_page_cursor(header).as_deref(), Some("abc123"));
    }

    #[test]
    fn ignores_previous_only_links() {
        let header = r#"<https://x.myshopify.com/admin/api/2023-10/orders.json?page_info=zzz&limit=250>; rel="previous""#;
        assert_eq!(next_page_cursor(header), None);
    }

    #[test]
    fn picks_next_among_multiple_relations() {
        let header = concat!(
            r#"<https://x.myshopify.com/admin/api/2023-10/orders.json?page_info=prev1>; rel="previous", "#,
            r#"<https://x.myshopify.com/admin/api/2023-10/orders.json?page_info=next1&limit=250>; rel="next""#
        );
        assert_eq!(next_page_cursor(header).as_deref(), Some("next1"));
    }

    #[test]
    fn no_link_header_content() {
        assert_eq!(next_page_cursor(""), None);
    }
}

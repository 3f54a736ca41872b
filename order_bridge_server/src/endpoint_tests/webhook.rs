use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use order_bridge_engine::{
    db_types::OrderState,
    sync_types::{CancelOutcome, UpsertOutcome},
    traits::OrderLedgerError,
    ConnectorApi,
    OrderSyncApi,
};
use serde_json::{json, Value};

use super::mocks::{test_connector, test_order, MockLedgerDb};
use crate::{
    helpers::calculate_hmac,
    shopify_routes::{ShopifyWebhookRoute, SHOP_DOMAIN_HEADER, SIGNATURE_HEADER, TOPIC_HEADER},
};

const ORDER_JSON: &str = include_str!("../../../shopify_client/src/test_assets/order1.json");
const WEBHOOK_SECRET: &str = "wh_secret";
const DOMAIN: &str = "bricks.myshopify.com";

async fn post_webhook(
    headers: Vec<(&str, String)>,
    body: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, Value) {
    let mut req = TestRequest::post().uri("/webhook");
    for (name, value) in headers {
        req = req.insert_header((name, value.as_str()));
    }
    let req = req.set_payload(body.to_string()).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::call_service(&service, req).await.into_parts();
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn signed_headers(topic: &str, body: &str) -> Vec<(&'static str, String)> {
    vec![
        (SIGNATURE_HEADER, calculate_hmac(WEBHOOK_SECRET, body.as_bytes())),
        (TOPIC_HEADER, topic.to_string()),
        (SHOP_DOMAIN_HEADER, DOMAIN.to_string()),
    ]
}

fn register(cfg: &mut ServiceConfig, orders_db: MockLedgerDb, connectors_db: MockLedgerDb) {
    cfg.service(ShopifyWebhookRoute::<MockLedgerDb>::new())
        .app_data(web::Data::new(OrderSyncApi::new(orders_db)))
        .app_data(web::Data::new(ConnectorApi::new(connectors_db)));
}

/// A backend that expects the request to be rejected before any database call is made.
fn configure_untouched_backend(cfg: &mut ServiceConfig) {
    register(cfg, MockLedgerDb::new(), MockLedgerDb::new());
}

fn connector_lookup(webhook_secret: Option<&'static str>) -> MockLedgerDb {
    let mut db = MockLedgerDb::new();
    db.expect_fetch_active_connector_for_domain().returning(move |_| Ok(Some(test_connector(webhook_secret))));
    db
}

#[actix_web::test]
async fn missing_headers_are_rejected() {
    let _ = env_logger::try_init().ok();
    for missing in [SIGNATURE_HEADER, TOPIC_HEADER, SHOP_DOMAIN_HEADER] {
        let headers = signed_headers("orders/create", ORDER_JSON)
            .into_iter()
            .filter(|(name, _)| *name != missing)
            .collect::<Vec<_>>();
        let (status, body) = post_webhook(headers, ORDER_JSON, configure_untouched_backend).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": format!("Missing {missing} header")}));
    }
}

#[actix_web::test]
async fn unknown_domain_is_acknowledged_with_an_error() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut connectors_db = MockLedgerDb::new();
        connectors_db.expect_fetch_active_connector_for_domain().returning(|_| Ok(None));
        register(cfg, MockLedgerDb::new(), connectors_db);
    }
    let (status, body) = post_webhook(signed_headers("orders/create", ORDER_JSON), ORDER_JSON, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Connector not found"}));
}

#[actix_web::test]
async fn bad_signature_is_acknowledged_with_an_error() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        register(cfg, MockLedgerDb::new(), connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let mut headers = signed_headers("orders/create", ORDER_JSON);
    headers[0].1 = calculate_hmac("not-the-secret", ORDER_JSON.as_bytes());
    let (status, body) = post_webhook(headers, ORDER_JSON, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Invalid signature"}));
}

#[actix_web::test]
async fn unhandled_topics_are_ignored() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        register(cfg, MockLedgerDb::new(), connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let (status, body) = post_webhook(signed_headers("products/update", "{}"), "{}", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ignored", "topic": "products/update"}));
}

#[actix_web::test]
async fn order_webhook_creates_the_order() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders_db = MockLedgerDb::new();
        orders_db
            .expect_upsert_order()
            .returning(|_, _| Ok((test_order("5875167887638", OrderState::Draft), UpsertOutcome::Created)));
        register(cfg, orders_db, connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let (status, body) = post_webhook(signed_headers("orders/create", ORDER_JSON), ORDER_JSON, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "topic": "orders/create",
            "order_id": "5875167887638",
            "order_name": "#1001",
        })
    );
}

#[actix_web::test]
async fn paid_webhook_confirms_a_fresh_draft() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut connectors_db = MockLedgerDb::new();
        connectors_db.expect_fetch_active_connector_for_domain().returning(|_| {
            let mut connector = test_connector(Some(WEBHOOK_SECRET));
            connector.auto_confirm_paid_orders = true;
            Ok(Some(connector))
        });
        let mut orders_db = MockLedgerDb::new();
        orders_db
            .expect_upsert_order()
            .returning(|_, _| Ok((test_order("5875167887638", OrderState::Draft), UpsertOutcome::Created)));
        orders_db
            .expect_confirm_order()
            .times(1)
            .returning(|_| Ok(test_order("5875167887638", OrderState::Confirmed)));
        register(cfg, orders_db, connectors_db);
    }
    let (status, body) = post_webhook(signed_headers("orders/paid", ORDER_JSON), ORDER_JSON, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["order_id"], "5875167887638");
}

#[actix_web::test]
async fn permissive_mode_accepts_any_signature() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        register(cfg, MockLedgerDb::new(), connector_lookup(None));
    }
    let mut headers = signed_headers("products/update", "{}");
    headers[0].1 = "complete garbage".to_string();
    let (status, body) = post_webhook(headers, "{}", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ignored", "topic": "products/update"}));
}

#[actix_web::test]
async fn cancellation_webhook_cancels_the_order() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders_db = MockLedgerDb::new();
        orders_db
            .expect_cancel_order()
            .returning(|_| Ok(CancelOutcome::Cancelled(test_order("5875167887638", OrderState::Cancelled))));
        register(cfg, orders_db, connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let (status, body) = post_webhook(signed_headers("orders/cancelled", ORDER_JSON), ORDER_JSON, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "topic": "orders/cancelled",
            "order_id": "5875167887638",
            "message": "Order cancelled",
        })
    );
}

#[actix_web::test]
async fn cancelling_an_unknown_order_reports_not_found() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders_db = MockLedgerDb::new();
        orders_db.expect_cancel_order().returning(|_| Ok(CancelOutcome::NotFound));
        register(cfg, orders_db, connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let (status, body) = post_webhook(signed_headers("orders/cancelled", ORDER_JSON), ORDER_JSON, configure).await;
    // Still a 200 so Shopify does not retry, but the body says no order was touched.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "not_found",
            "topic": "orders/cancelled",
            "order_id": "5875167887638",
            "message": "Order not found; nothing to do",
        })
    );
}

#[actix_web::test]
async fn backend_errors_are_acknowledged_not_retried() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders_db = MockLedgerDb::new();
        orders_db.expect_upsert_order().returning(|_, _| Err(OrderLedgerError::NoCustomerAvailable));
        register(cfg, orders_db, connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let (status, body) = post_webhook(signed_headers("orders/create", ORDER_JSON), ORDER_JSON, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"error": "Customer creation is disabled for this connector and no fallback customer is configured"})
    );
}

#[actix_web::test]
async fn database_errors_are_not_leaked() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders_db = MockLedgerDb::new();
        orders_db
            .expect_upsert_order()
            .returning(|_, _| Err(OrderLedgerError::DatabaseError("UNIQUE constraint failed: secrets".to_string())));
        register(cfg, orders_db, connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let (status, body) = post_webhook(signed_headers("orders/create", ORDER_JSON), ORDER_JSON, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[actix_web::test]
async fn garbage_body_is_acknowledged_with_an_error() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        register(cfg, MockLedgerDb::new(), connector_lookup(Some(WEBHOOK_SECRET)));
    }
    let body = "this is not json";
    let (status, response) = post_webhook(signed_headers("orders/create", body), body, configure).await;
    assert_eq!(status, StatusCode::OK);
    let message = response["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid order payload."), "unexpected error: {message}");
}

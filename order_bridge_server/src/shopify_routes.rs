//----------------------------------------------   Order bridge routes   ----------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info, trace, warn};
use order_bridge_engine::{
    sync_types::{CancelOutcome, UpsertOutcome},
    traits::OrderLedgerDatabase,
    ConnectorApi,
    OrderSyncApi,
};
use serde_json::json;
use shopify_client::ShopifyOrder;

use crate::{
    data_objects::{ConnectionTestResult, ConnectorInfo, JsonResponse, NewConnectorRequest},
    errors::ServerError,
    helpers::verify_webhook_signature,
    integrations::{
        importer::{api_for_connector, import_with_bookkeeping, ImportError},
        shopify::{order_payload_from_shopify, WebhookEvent},
    },
    route,
};

pub const SIGNATURE_HEADER: &str = "X-Shopify-Hmac-Sha256";
pub const TOPIC_HEADER: &str = "X-Shopify-Topic";
pub const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers().get(name).and_then(|v| v.to_str().ok()).map(String::from)
}

/// Webhook replies go back to the store; raw database errors stay in the logs.
fn public_error(e: &order_bridge_engine::traits::OrderLedgerError) -> String {
    use order_bridge_engine::traits::OrderLedgerError::*;
    match e {
        DatabaseError(_) | StatusConversionError(_) => "Internal server error".to_string(),
        e => e.to_string(),
    }
}

//----------------------------------------------   Webhook   ----------------------------------------------

route!(shopify_webhook => Post "/webhook" impl OrderLedgerDatabase);
/// The webhook entry point for order events pushed by Shopify.
///
/// The body arrives as raw bytes because the signature covers the exact bytes on the wire;
/// parsing happens only after the gate. Apart from structurally missing headers (a 400), every
/// outcome is a 200 with a JSON body — Shopify retries non-2xx responses, and a delivery that
/// failed verification must not be redelivered forever.
pub async fn shopify_webhook<B: OrderLedgerDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    orders: web::Data<OrderSyncApi<B>>,
    connectors: web::Data<ConnectorApi<B>>,
) -> HttpResponse {
    trace!("🛍️️ Received webhook request: {}", req.uri());
    let Some(signature) = header_value(&req, SIGNATURE_HEADER) else {
        return HttpResponse::BadRequest().json(json!({"error": format!("Missing {SIGNATURE_HEADER} header")}));
    };
    let Some(topic) = header_value(&req, TOPIC_HEADER) else {
        return HttpResponse::BadRequest().json(json!({"error": format!("Missing {TOPIC_HEADER} header")}));
    };
    let Some(domain) = header_value(&req, SHOP_DOMAIN_HEADER) else {
        return HttpResponse::BadRequest().json(json!({"error": format!("Missing {SHOP_DOMAIN_HEADER} header")}));
    };
    let connector = match connectors.connector_for_domain(&domain).await {
        Ok(Some(connector)) => connector,
        Ok(None) => {
            warn!("🛍️️ Webhook from {domain}, but no active connector is configured for it.");
            return HttpResponse::Ok().json(json!({"error": "Connector not found"}));
        },
        Err(e) => {
            warn!("🛍️️ Could not look up connector for {domain}. {e}");
            return HttpResponse::Ok().json(json!({"error": public_error(&e)}));
        },
    };
    if !verify_webhook_signature(&body, &signature, connector.webhook_secret.as_ref()) {
        warn!("🛍️️ Webhook for {domain} failed signature verification.");
        return HttpResponse::Ok().json(json!({"error": "Invalid signature"}));
    }
    match WebhookEvent::classify(&topic) {
        WebhookEvent::Ignored => {
            debug!("🛍️️ Ignoring webhook topic {topic}");
            HttpResponse::Ok().json(json!({"status": "ignored", "topic": topic}))
        },
        WebhookEvent::UpsertOrder => {
            let order: ShopifyOrder = match serde_json::from_slice(&body) {
                Ok(order) => order,
                Err(e) => {
                    warn!("🛍️️ Could not parse webhook body for {domain}. {e}");
                    return HttpResponse::Ok().json(json!({"error": format!("Invalid order payload. {e}")}));
                },
            };
            let order_name = order.name.clone();
            let payload = match order_payload_from_shopify(order) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("🛍️️ Could not convert order. {e}");
                    return HttpResponse::Ok().json(json!({"error": e.to_string()}));
                },
            };
            match orders.process_order(&connector, &payload).await {
                Ok((order, outcome)) => {
                    match outcome {
                        UpsertOutcome::Created => info!("🛍️️ Order [{}] created from webhook.", order.shopify_order_id),
                        UpsertOutcome::Reconciled { changed } => {
                            debug!("🛍️️ Order [{}] reconciled (changed: {changed}).", order.shopify_order_id)
                        },
                    }
                    HttpResponse::Ok().json(json!({
                        "status": "success",
                        "topic": topic,
                        "order_id": order.shopify_order_id,
                        "order_name": order_name,
                    }))
                },
                Err(e) => {
                    warn!("🛍️️ Could not process order [{}]. {e}", payload.order_id);
                    HttpResponse::Ok().json(json!({"error": public_error(&e)}))
                },
            }
        },
        WebhookEvent::CancelOrder => {
            let order: ShopifyOrder = match serde_json::from_slice(&body) {
                Ok(order) => order,
                Err(e) => {
                    warn!("🛍️️ Could not parse cancellation body for {domain}. {e}");
                    return HttpResponse::Ok().json(json!({"error": format!("Invalid order payload. {e}")}));
                },
            };
            let order_id = order.id.to_string();
            match orders.cancel_order(&order_id.as_str().into()).await {
                Ok(CancelOutcome::Cancelled(order)) => {
                    info!("🛍️️ Order [{}] cancelled from webhook.", order.shopify_order_id);
                    HttpResponse::Ok().json(json!({
                        "status": "success",
                        "topic": topic,
                        "order_id": order_id,
                        "message": "Order cancelled",
                    }))
                },
                Ok(CancelOutcome::NotFound) => {
                    debug!("🛍️️ Cancellation for unknown order {order_id}.");
                    // Acknowledged, but distinct from a successful cancellation.
                    HttpResponse::Ok().json(json!({
                        "status": "not_found",
                        "topic": topic,
                        "order_id": order_id,
                        "message": "Order not found; nothing to do",
                    }))
                },
                Err(e) => {
                    warn!("🛍️️ Could not cancel order {order_id}. {e}");
                    HttpResponse::Ok().json(json!({"error": public_error(&e)}))
                },
            }
        },
    }
}

//----------------------------------------------   Connectors   ----------------------------------------------

route!(create_connector => Post "/connectors" impl OrderLedgerDatabase);
pub async fn create_connector<B: OrderLedgerDatabase>(
    body: web::Json<NewConnectorRequest>,
    connectors: web::Data<ConnectorApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("🛍️️ POST new connector for store {}", request.store_url);
    let connector = connectors.register_connector(request.into()).await?;
    Ok(HttpResponse::Ok().json(ConnectorInfo::from(connector)))
}

route!(connector_info => Get "/connectors/{id}" impl OrderLedgerDatabase);
pub async fn connector_info<B: OrderLedgerDatabase>(
    path: web::Path<i64>,
    connectors: web::Data<ConnectorApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let connector = connectors.fetch_connector(id).await?;
    Ok(HttpResponse::Ok().json(ConnectorInfo::from(connector)))
}

route!(deactivate_connector => Delete "/connectors/{id}" impl OrderLedgerDatabase);
pub async fn deactivate_connector<B: OrderLedgerDatabase>(
    path: web::Path<i64>,
    connectors: web::Data<ConnectorApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    connectors.deactivate_connector(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Connector {id} deactivated"))))
}

route!(test_connection => Get "/connectors/{id}/test" impl OrderLedgerDatabase);
/// Calls the upstream shop endpoint with the connector's credentials. A failed call is a normal,
/// message-carrying result rather than an error response, so operators see exactly what broke.
pub async fn test_connection<B: OrderLedgerDatabase>(
    path: web::Path<i64>,
    connectors: web::Data<ConnectorApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let connector = connectors.fetch_connector(id).await?;
    let api = api_for_connector(&connector).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let result = match api.get_shop().await {
        Ok(shop) => {
            info!("🛍️️ Connection test for connector {id} succeeded ({})", shop.name);
            ConnectionTestResult {
                success: true,
                shop_name: Some(shop.name),
                shop_domain: Some(shop.domain),
                message: "Connection OK".to_string(),
            }
        },
        Err(e) => {
            warn!("🛍️️ Connection test for connector {id} failed. {e}");
            ConnectionTestResult { success: false, shop_name: None, shop_domain: None, message: e.to_string() }
        },
    };
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Imports   ----------------------------------------------

route!(import_orders => Post "/connectors/{id}/import" impl OrderLedgerDatabase);
/// Manually triggered import for one connector. Failures surface as blocking error responses.
pub async fn import_orders<B: OrderLedgerDatabase>(
    path: web::Path<i64>,
    connectors: web::Data<ConnectorApi<B>>,
    orders: web::Data<OrderSyncApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let connector = connectors.fetch_connector(id).await?;
    if !connector.is_active {
        return Err(ServerError::InvalidRequestBody(format!("Connector {id} is deactivated")));
    }
    let api = api_for_connector(&connector).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let summary = import_with_bookkeeping(orders.db(), &api, &connector).await.map_err(|e| match e {
        ImportError::Transport(e) => ServerError::UpstreamApiError(e.to_string()),
        ImportError::Ledger(e) => ServerError::BackendError(e.to_string()),
    })?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(cron_import => Post "/import/cron" impl OrderLedgerDatabase);
/// The scheduled-import entry point: runs an import for every active, auto-import-enabled
/// connector. Per-connector failures are recorded on the connector and do not abort the sweep.
pub async fn cron_import<B: OrderLedgerDatabase>(
    connectors: web::Data<ConnectorApi<B>>,
    orders: web::Data<OrderSyncApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let candidates = connectors.auto_import_connectors().await?;
    info!("🕰️ Cron import: {} connectors to check", candidates.len());
    let mut results = Vec::with_capacity(candidates.len());
    for connector in candidates {
        let result = match api_for_connector(&connector) {
            Ok(api) => import_with_bookkeeping(orders.db(), &api, &connector).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(summary) => results.push(json!({"connector_id": connector.id, "success": true, "summary": summary})),
            Err(message) => {
                results.push(json!({"connector_id": connector.id, "success": false, "error": message}))
            },
        }
    }
    Ok(HttpResponse::Ok().json(json!({"results": results})))
}

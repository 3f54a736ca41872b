use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_bridge_engine::{sqlite::MIGRATOR, ConnectorApi, OrderSyncApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    import_worker::start_import_worker,
    routes::health,
    shopify_routes::{
        ConnectorInfoRoute,
        CreateConnectorRoute,
        CronImportRoute,
        DeactivateConnectorRoute,
        ImportOrdersRoute,
        ShopifyWebhookRoute,
        TestConnectionRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    MIGRATOR.run(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_import {
        let _worker = start_import_worker(db.clone(), config.auto_import_interval);
    } else {
        info!("🪛️ Auto-import is disabled. Only webhooks and manual imports will run.");
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderSyncApi::new(db.clone());
        let connectors_api = ConnectorApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("obr::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(connectors_api));
        let api_scope = web::scope("/api")
            .service(CreateConnectorRoute::<SqliteDatabase>::new())
            .service(ConnectorInfoRoute::<SqliteDatabase>::new())
            .service(DeactivateConnectorRoute::<SqliteDatabase>::new())
            .service(TestConnectionRoute::<SqliteDatabase>::new())
            .service(ImportOrdersRoute::<SqliteDatabase>::new())
            .service(CronImportRoute::<SqliteDatabase>::new());
        let shopify_scope = web::scope("/shopify").service(ShopifyWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(shopify_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

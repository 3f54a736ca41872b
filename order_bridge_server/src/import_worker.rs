use chrono::{Duration, Utc};
use log::*;
use order_bridge_engine::{db_types::ConnectorConfig, traits::OrderLedgerDatabase, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::integrations::importer::{api_for_connector, import_with_bookkeeping};

/// Starts the scheduled import worker. Do not await the returned JoinHandle, as it will run
/// indefinitely.
///
/// Every tick, each active auto-import connector whose `import_interval_minutes` has elapsed
/// since its watermark gets a full import run. Connector runs are sequential within a tick; the
/// idempotent upsert makes overlap with webhook deliveries or a manual import harmless.
pub fn start_import_worker(db: SqliteDatabase, interval: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Scheduled order import worker started");
        loop {
            timer.tick().await;
            let connectors = match db.fetch_auto_import_connectors().await {
                Ok(connectors) => connectors,
                Err(e) => {
                    error!("🕰️ Could not fetch connectors for the import sweep: {e}");
                    continue;
                },
            };
            let due = connectors.into_iter().filter(is_due).collect::<Vec<_>>();
            if due.is_empty() {
                trace!("🕰️ No connectors due for import");
                continue;
            }
            info!("🕰️ Running scheduled import for {} connectors", due.len());
            for connector in due {
                let api = match api_for_connector(&connector) {
                    Ok(api) => api,
                    Err(e) => {
                        error!("🕰️ Connector {} has an unusable configuration: {e}", connector.id);
                        continue;
                    },
                };
                // Failures are recorded on the connector and retried on the next due tick.
                match import_with_bookkeeping(&db, &api, &connector).await {
                    Ok(summary) => {
                        info!(
                            "🕰️ Connector {}: {} orders imported, {} skipped",
                            connector.id, summary.imported, summary.skipped
                        );
                    },
                    Err(e) => {
                        error!("🕰️ Scheduled import for connector {} failed: {e}", connector.id);
                    },
                }
            }
        }
    })
}

fn is_due(connector: &ConnectorConfig) -> bool {
    match connector.last_order_import {
        None => true,
        Some(watermark) => watermark + Duration::minutes(connector.import_interval_minutes) <= Utc::now(),
    }
}

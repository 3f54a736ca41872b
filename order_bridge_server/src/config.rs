use std::{env, time::Duration};

use log::*;
use obr_common::parse_boolean_flag;

const DEFAULT_OBR_HOST: &str = "127.0.0.1";
const DEFAULT_OBR_PORT: u16 = 8360;
const DEFAULT_IMPORT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// When false, the scheduled import worker is not started. Webhooks and manual imports still
    /// work. Set this when an external scheduler drives the cron endpoint instead.
    pub auto_import: bool,
    /// How often the import worker checks connectors for due imports.
    pub auto_import_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OBR_HOST.to_string(),
            port: DEFAULT_OBR_PORT,
            database_url: String::default(),
            auto_import: true,
            auto_import_interval: DEFAULT_IMPORT_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OBR_HOST").ok().unwrap_or_else(|| DEFAULT_OBR_HOST.into());
        let port = env::var("OBR_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OBR_PORT. {e} Using the default, {DEFAULT_OBR_PORT}, instead."
                    );
                    DEFAULT_OBR_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OBR_PORT);
        let database_url = order_bridge_engine::sqlite::db::db_url();
        let auto_import = parse_boolean_flag(env::var("OBR_AUTO_IMPORT").ok(), true);
        let auto_import_interval = env::var("OBR_AUTO_IMPORT_INTERVAL_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for OBR_AUTO_IMPORT_INTERVAL_SECS. {e} Using the default.");
                        e
                    })
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_IMPORT_INTERVAL);
        Self { host, port, database_url, auto_import, auto_import_interval }
    }
}

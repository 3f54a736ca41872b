//! # Order bridge server
//! The HTTP front-end of the order bridge. It is responsible for:
//! * Listening for incoming order webhooks from Shopify, gating them on a per-connector HMAC
//!   signature, and feeding them to the sync engine.
//! * Exposing connector management and import endpoints under `/api`.
//! * Running the scheduled import worker.
//!
//! ## Configuration
//! The server is configured via environment variables (`OBR_HOST`, `OBR_PORT`,
//! `OBR_DATABASE_URL`, `OBR_AUTO_IMPORT`, `OBR_AUTO_IMPORT_INTERVAL_SECS`). See [config] for
//! details.
//!
//! ## Routes
//! * `GET /health`: liveness check.
//! * `POST /shopify/webhook`: the order-event webhook.
//! * `POST /api/connectors`, `GET /api/connectors/{id}`, `DELETE /api/connectors/{id}`:
//!   connector management.
//! * `GET /api/connectors/{id}/test`: upstream connection test.
//! * `POST /api/connectors/{id}/import`: manual import.
//! * `POST /api/import/cron`: scheduled-import entry point for external schedulers.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod import_worker;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod shopify_routes;

#[cfg(test)]
mod endpoint_tests;

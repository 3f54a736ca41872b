use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{
        ConnectorConfig,
        Customer,
        Item,
        NewConnectorConfig,
        Order,
        OrderId,
        OrderLine,
        OrderState,
        StatusConversionError,
        SyncStatus,
    },
    sync_types::{CancelOutcome, NewOrderPayload, UpsertOutcome},
};

/// The storage contract for the order bridge.
///
/// Implementations must make [`upsert_order`](Self::upsert_order) atomic: either the full order
/// (customer, address, lines) is committed, or nothing is. Replays of the same upstream order id
/// must reconcile rather than duplicate.
#[allow(async_fn_in_trait)]
pub trait OrderLedgerDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    //--------------------------------- Connector management ----------------------------------

    async fn fetch_connector(&self, id: i64) -> Result<Option<ConnectorConfig>, OrderLedgerError>;

    /// Looks up the single active connector for a store domain. Webhook deliveries are routed by
    /// the shop-domain header through this call.
    async fn fetch_active_connector_for_domain(&self, domain: &str) -> Result<Option<ConnectorConfig>, OrderLedgerError>;

    /// All active connectors with auto-import enabled, for the scheduled import sweep.
    async fn fetch_auto_import_connectors(&self) -> Result<Vec<ConnectorConfig>, OrderLedgerError>;

    /// Registers a new connector. Fails with [`OrderLedgerError::DuplicateConnector`] when an
    /// active connector for the same store domain already exists.
    async fn insert_connector(&self, connector: NewConnectorConfig) -> Result<ConnectorConfig, OrderLedgerError>;

    async fn deactivate_connector(&self, id: i64) -> Result<(), OrderLedgerError>;

    /// Records the outcome of a sync run (success or error, with a human-readable message).
    async fn record_sync_result(&self, id: i64, status: SyncStatus, message: &str) -> Result<(), OrderLedgerError>;

    /// Advances the import watermark and bumps the lifetime import counter after a completed
    /// bulk-import run. Called once per run, never per page.
    async fn mark_import_complete(&self, id: i64, imported: i64, watermark: DateTime<Utc>) -> Result<(), OrderLedgerError>;

    //------------------------------------ Order sync -----------------------------------------

    /// Creates or reconciles the ledger order for the given payload, atomically.
    ///
    /// When no order with the payload's upstream id exists, the customer, delivery address and
    /// line items are resolved and a complete order is created in `Draft` state. When the order
    /// already exists, only the store-reported status columns are reconciled; workflow state and
    /// lines are left alone.
    async fn upsert_order(
        &self,
        connector: &ConnectorConfig,
        payload: &NewOrderPayload,
    ) -> Result<(Order, UpsertOutcome), OrderLedgerError>;

    /// Moves a draft order to `Confirmed`. Any other starting state is an error.
    async fn confirm_order(&self, order_id: i64) -> Result<Order, OrderLedgerError>;

    /// Cancels the ledger order for the given upstream id. Non-terminal orders move to
    /// `Cancelled`; terminal orders keep their state. The store-reported statuses are set to
    /// `voided` / `restocked` regardless. Unknown ids report [`CancelOutcome::NotFound`].
    async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, OrderLedgerError>;

    async fn fetch_order_by_shopify_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderLedgerError>;

    async fn fetch_lines_for_order(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderLedgerError>;

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, OrderLedgerError>;

    async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, OrderLedgerError>;

    async fn fetch_item_by_sku(&self, sku: &str) -> Result<Option<Item>, OrderLedgerError>;

    async fn fetch_order_count(&self, connector_id: i64) -> Result<i64, OrderLedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderLedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested connector id {0} does not exist")]
    ConnectorNotFound(i64),
    #[error("An active connector for store {0} already exists")]
    DuplicateConnector(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Illegal order state change from {from} to {to}")]
    InvalidStateTransition { from: OrderState, to: OrderState },
    #[error("Customer creation is disabled for this connector and no fallback customer is configured")]
    NoCustomerAvailable,
    #[error("No matching item, and no default item is configured for this connector")]
    NoItemAvailable,
    #[error("Invalid status value in the database: {0}")]
    StatusConversionError(String),
}

impl From<sqlx::Error> for OrderLedgerError {
    fn from(e: sqlx::Error) -> Self {
        OrderLedgerError::DatabaseError(e.to_string())
    }
}

impl From<StatusConversionError> for OrderLedgerError {
    fn from(e: StatusConversionError) -> Self {
        OrderLedgerError::StatusConversionError(e.0)
    }
}

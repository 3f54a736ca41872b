use log::*;

use crate::{
    db_types::{ConnectorConfig, FinancialStatus, Order, OrderId, OrderState},
    sync_types::{CancelOutcome, NewOrderPayload, UpsertOutcome},
    traits::{OrderLedgerDatabase, OrderLedgerError},
};

/// The order-sync workflow over a ledger backend.
#[derive(Clone)]
pub struct OrderSyncApi<B> {
    db: B,
}

impl<B> OrderSyncApi<B>
where B: OrderLedgerDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Creates or reconciles the ledger order for the payload.
    ///
    /// When the connector has auto-confirm enabled and the store reports the order as paid, a
    /// freshly created draft is confirmed as a follow-up step. A confirmation failure is logged
    /// and swallowed; the committed order must never be lost because a workflow nicety failed.
    pub async fn process_order(
        &self,
        connector: &ConnectorConfig,
        payload: &NewOrderPayload,
    ) -> Result<(Order, UpsertOutcome), OrderLedgerError> {
        let (order, outcome) = self.db.upsert_order(connector, payload).await?;
        debug!("🔄️ Order [{}] processed: {outcome:?}", order.shopify_order_id);
        let should_confirm = connector.auto_confirm_paid_orders &&
            payload.financial_status == FinancialStatus::Paid &&
            order.state == OrderState::Draft;
        if !should_confirm {
            return Ok((order, outcome));
        }
        match self.db.confirm_order(order.id).await {
            Ok(order) => Ok((order, outcome)),
            Err(e) => {
                warn!("🔄️ Could not auto-confirm paid order [{}]: {e}", order.shopify_order_id);
                Ok((order, outcome))
            },
        }
    }

    /// Cancels the ledger order for the given upstream id.
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<CancelOutcome, OrderLedgerError> {
        self.db.cancel_order(order_id).await
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderLedgerError> {
        self.db.fetch_order_by_shopify_id(order_id).await
    }
}

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::inventory::InventoryLedger;
use crate::lifecycle::Aggregate;
use crate::metrics::Metrics;
use crate::storage::{record_events, Store, UnitOfWork};
use super::aggregate::Order;
use super::commands::OrderCommand;
use super::errors::OrderError;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: lock row → Aggregate → status update (+ stock release on
// cancel) → audit → commit, all inside one unit of work.
//
// ============================================================================

pub struct OrderCommandHandler<S: Store> {
    store: Arc<S>,
    metrics: Arc<Metrics>,
}

impl<S: Store> OrderCommandHandler<S> {
    pub fn new(store: Arc<S>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let mut uow = self.store.begin().await?;
        let order = uow.order(order_id).await?.ok_or(OrderError::NotFound(order_id))?;
        uow.rollback().await?;
        Ok(order)
    }

    pub async fn mark_paid(&self, order_id: Uuid, actor: Uuid) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::MarkPaid, actor).await
    }

    pub async fn ship(&self, order_id: Uuid, actor: Uuid) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::Ship, actor).await
    }

    pub async fn complete(&self, order_id: Uuid, actor: Uuid) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::Complete, actor).await
    }

    /// Cancel a Pending or Paid order and put every item back in stock.
    pub async fn cancel(&self, order_id: Uuid, actor: Uuid, reason: Option<String>) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::Cancel { reason }, actor).await
    }

    /// Handle a command and persist the resulting state
    pub async fn handle(&self, order_id: Uuid, command: OrderCommand, actor: Uuid) -> Result<Order, OrderError> {
        let mut uow = self.store.begin().await?;

        let mut order = uow
            .lock_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        let from = order.status();

        let events = order.execute(&command)?;
        uow.update_order_status(order_id, order.status()).await?;

        if matches!(command, OrderCommand::Cancel { .. }) {
            for item in order.items() {
                InventoryLedger::release(&mut uow, item.product_id, item.quantity).await?;
            }
        }

        record_events(&mut uow, &order, events, Uuid::now_v7(), actor).await?;
        uow.commit().await?;

        tracing::info!(
            order_id = %order_id,
            actor = %actor,
            from = %from,
            to = %order.status(),
            "Order status changed"
        );
        self.metrics.record_order_transition(from.as_str(), order.status().as_str());

        Ok(order)
    }
}

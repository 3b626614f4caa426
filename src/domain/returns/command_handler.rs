use std::sync::Arc;

use uuid::Uuid;

use crate::domain::inventory::InventoryLedger;
use crate::domain::ledger::Transaction;
use crate::domain::Money;
use crate::lifecycle::Aggregate;
use crate::metrics::Metrics;
use crate::storage::{record_events, Store, StoreError, UnitOfWork};
use super::aggregate::OrderReturn;
use super::commands::ReturnCommand;
use super::errors::ReturnError;
use super::value_objects::{ReturnReason, ReturnStatus};

// ============================================================================
// Return Workflow
// ============================================================================
//
// request → decide → complete_refund. `complete_refund` is keyed on the
// return id: once a return is Completed it already points at its refund
// transaction, and a repeated call hands that transaction back untouched.
// Restock, refund row and the Completed status are written in the same
// unit of work as the row lock on the return.
//
// ============================================================================

pub struct ReturnWorkflow<S: Store> {
    store: Arc<S>,
    metrics: Arc<Metrics>,
}

impl<S: Store> ReturnWorkflow<S> {
    pub fn new(store: Arc<S>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    pub async fn get_return(&self, return_id: Uuid) -> Result<OrderReturn, ReturnError> {
        let mut uow = self.store.begin().await?;
        let order_return = uow
            .order_return(return_id)
            .await?
            .ok_or(ReturnError::ReturnNotFound(return_id))?;
        uow.rollback().await?;
        Ok(order_return)
    }

    pub async fn request_return(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        reason: ReturnReason,
        description: &str,
    ) -> Result<OrderReturn, ReturnError> {
        let mut uow = self.store.begin().await?;

        let order = uow
            .lock_order(order_id)
            .await?
            .ok_or(ReturnError::OrderNotFound(order_id))?;
        let existing = uow.returns_for_order(order_id).await?;

        let (order_return, requested) = OrderReturn::request(&order, &existing, user_id, reason, description)?;

        match uow.insert_return(&order_return).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(ReturnError::DuplicateReturn(order_id)),
            Err(e) => return Err(e.into()),
        }
        record_events(&mut uow, &order_return, vec![requested], Uuid::now_v7(), user_id).await?;
        uow.commit().await?;

        tracing::info!(
            return_id = %order_return.id,
            order_id = %order_id,
            user_id = %user_id,
            reason = reason.as_str(),
            "Return requested"
        );

        Ok(order_return)
    }

    /// Approve (with a refund amount) or reject a Pending return.
    pub async fn decide(
        &self,
        return_id: Uuid,
        approve: bool,
        admin_note: Option<String>,
        refund_amount: Option<Money>,
        actor: Uuid,
    ) -> Result<OrderReturn, ReturnError> {
        let mut uow = self.store.begin().await?;

        let mut order_return = uow
            .lock_return(return_id)
            .await?
            .ok_or(ReturnError::ReturnNotFound(return_id))?;
        let from = order_return.status;

        let command = if approve {
            let order = uow
                .order(order_return.order_id)
                .await?
                .ok_or(ReturnError::OrderNotFound(order_return.order_id))?;
            ReturnCommand::Approve {
                refund_amount,
                admin_note,
                order_total: order.total_amount(),
            }
        } else {
            ReturnCommand::Reject { admin_note }
        };

        let events = order_return.execute(&command)?;
        uow.update_return(&order_return).await?;
        record_events(&mut uow, &order_return, events, Uuid::now_v7(), actor).await?;
        uow.commit().await?;

        tracing::info!(
            return_id = %return_id,
            actor = %actor,
            status = %order_return.status,
            refund_amount = ?order_return.refund_amount.map(|m| m.to_string()),
            "Return decided"
        );
        self.metrics.record_return_transition(from.as_str(), order_return.status.as_str());

        Ok(order_return)
    }

    /// Approved → Completed: refund row, restock, status. Idempotent per return.
    pub async fn complete_refund(&self, return_id: Uuid, actor: Uuid) -> Result<Transaction, ReturnError> {
        let mut uow = self.store.begin().await?;

        let mut order_return = uow
            .lock_return(return_id)
            .await?
            .ok_or(ReturnError::ReturnNotFound(return_id))?;

        if order_return.status == ReturnStatus::Completed {
            let refund = self.existing_refund(&mut uow, &order_return).await?;
            uow.rollback().await?;
            tracing::debug!(return_id = %return_id, transaction_id = %refund.id, "Refund already completed");
            return Ok(refund);
        }

        let order = uow
            .order(order_return.order_id)
            .await?
            .ok_or(ReturnError::OrderNotFound(order_return.order_id))?;

        // Validates Approved before anything is written
        order_return.handle_command(&ReturnCommand::CompleteRefund {
            refund_transaction_id: Uuid::nil(),
        })?;

        let refund_amount = order_return.approved_refund_amount()?;
        let refund = Transaction::refund(order.id(), order.user_id(), refund_amount);
        uow.insert_transaction(&refund).await?;

        let events = order_return.execute(&ReturnCommand::CompleteRefund {
            refund_transaction_id: refund.id,
        })?;
        uow.update_return(&order_return).await?;

        for item in order.items() {
            InventoryLedger::release(&mut uow, item.product_id, item.quantity).await?;
        }

        record_events(&mut uow, &order_return, events, Uuid::now_v7(), actor).await?;
        uow.commit().await?;

        tracing::info!(
            return_id = %return_id,
            order_id = %order.id(),
            transaction_id = %refund.id,
            amount = %refund.amount,
            "Refund completed and stock restored"
        );
        self.metrics.record_return_transition(ReturnStatus::Approved.as_str(), ReturnStatus::Completed.as_str());
        self.metrics.record_refund(refund.amount);

        Ok(refund)
    }

    async fn existing_refund(&self, uow: &mut S::Unit, order_return: &OrderReturn) -> Result<Transaction, ReturnError> {
        let missing = || {
            ReturnError::Store(StoreError::Corrupt(format!(
                "completed return {} has no refund transaction",
                order_return.id
            )))
        };
        let transaction_id = order_return.refund_transaction_id.ok_or_else(missing)?;
        uow.transaction(transaction_id).await?.ok_or_else(missing)
    }
}

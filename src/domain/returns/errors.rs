use uuid::Uuid;

use crate::domain::inventory::InventoryError;
use crate::domain::order::OrderStatus;
use crate::domain::{Classify, ErrorKind, Money};
use crate::storage::StoreError;
use super::value_objects::ReturnStatus;

// ============================================================================
// Return Workflow Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReturnError {
    #[error("Return not found: {0}")]
    ReturnNotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("User {user_id} does not own order {order_id}")]
    NotOrderOwner { order_id: Uuid, user_id: Uuid },

    #[error("Order in status {0} cannot be returned")]
    InvalidOrderState(OrderStatus),

    #[error("Order {0} already has an open or completed return")]
    DuplicateReturn(Uuid),

    #[error("Invalid return transition from {from} to {to}")]
    InvalidStateTransition { from: ReturnStatus, to: ReturnStatus },

    #[error("Refund amount is required to approve a return")]
    RefundAmountRequired,

    #[error("Refund amount must be positive, got {0}")]
    InvalidRefundAmount(Money),

    #[error("Refund amount {refund} exceeds order total {total}")]
    RefundAmountExceedsOrderTotal { refund: Money, total: Money },

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for ReturnError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReturnError::ReturnNotFound(_) | ReturnError::OrderNotFound(_) => ErrorKind::NotFound,
            ReturnError::NotOrderOwner { .. } => ErrorKind::Forbidden,
            ReturnError::RefundAmountRequired
            | ReturnError::InvalidRefundAmount(_)
            | ReturnError::RefundAmountExceedsOrderTotal { .. } => ErrorKind::Validation,
            ReturnError::InvalidOrderState(_)
            | ReturnError::DuplicateReturn(_)
            | ReturnError::InvalidStateTransition { .. } => ErrorKind::Conflict,
            ReturnError::Inventory(e) => e.kind(),
            ReturnError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

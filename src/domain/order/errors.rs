use uuid::Uuid;

use crate::domain::inventory::InventoryError;
use crate::domain::{Classify, ErrorKind, Money};
use crate::storage::StoreError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Shipping address is required")]
    MissingShippingAddress,

    #[error("Order amount overflows")]
    AmountOverflow,

    #[error("Order total {recorded} does not match item sum {computed}")]
    TotalMismatch { recorded: Money, computed: Money },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for OrderError {
    fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::EmptyItems
            | OrderError::InvalidQuantity(_)
            | OrderError::MissingShippingAddress
            | OrderError::AmountOverflow => ErrorKind::Validation,
            OrderError::InvalidStatusTransition { .. } => ErrorKind::Conflict,
            OrderError::TotalMismatch { .. } => ErrorKind::Infrastructure,
            OrderError::Inventory(e) => e.kind(),
            OrderError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

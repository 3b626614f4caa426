use uuid::Uuid;

use crate::domain::inventory::InventoryError;
use crate::domain::order::OrderError;
use crate::domain::{Classify, ErrorKind};
use crate::storage::StoreError;

// ============================================================================
// Checkout Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product is not active: {product_id}")]
    InactiveProduct { product_id: Uuid },

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: Uuid },

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: Uuid },

    #[error("Invalid order: {0}")]
    InvalidOrder(#[source] OrderError),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),
}

impl From<InventoryError> for CheckoutError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock { product_id, .. } => CheckoutError::InsufficientStock { product_id },
            InventoryError::ProductNotFound(product_id) => CheckoutError::ProductNotFound { product_id },
            InventoryError::Store(e) => CheckoutError::PersistenceFailure(e),
            InventoryError::InvalidQuantity(q) => CheckoutError::InvalidOrder(OrderError::InvalidQuantity(q)),
        }
    }
}

impl From<OrderError> for CheckoutError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Store(e) => CheckoutError::PersistenceFailure(e),
            other => CheckoutError::InvalidOrder(other),
        }
    }
}

impl Classify for CheckoutError {
    fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::EmptyCart | CheckoutError::InactiveProduct { .. } => ErrorKind::Validation,
            CheckoutError::ProductNotFound { .. } => ErrorKind::NotFound,
            CheckoutError::InsufficientStock { .. } => ErrorKind::Conflict,
            CheckoutError::InvalidOrder(e) => e.kind(),
            CheckoutError::PersistenceFailure(_) => ErrorKind::Infrastructure,
        }
    }
}

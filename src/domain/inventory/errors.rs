use uuid::Uuid;

use crate::domain::{Classify, ErrorKind};
use crate::storage::StoreError;

// ============================================================================
// Inventory Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: Uuid, requested: i32 },

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Stock movement quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for InventoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::InsufficientStock { .. } => ErrorKind::Conflict,
            InventoryError::ProductNotFound(_) => ErrorKind::NotFound,
            InventoryError::InvalidQuantity(_) => ErrorKind::Validation,
            InventoryError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

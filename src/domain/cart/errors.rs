use uuid::Uuid;

use crate::domain::{Classify, ErrorKind};
use crate::storage::StoreError;

// ============================================================================
// Cart Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Cart quantity must be between 1 and 100, got {0}")]
    QuantityOutOfRange(i32),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product is not active: {0}")]
    InactiveProduct(Uuid),

    #[error("No cart line for product {0}")]
    LineNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for CartError {
    fn kind(&self) -> ErrorKind {
        match self {
            CartError::QuantityOutOfRange(_) | CartError::InactiveProduct(_) => ErrorKind::Validation,
            CartError::ProductNotFound(_) | CartError::LineNotFound(_) => ErrorKind::NotFound,
            CartError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

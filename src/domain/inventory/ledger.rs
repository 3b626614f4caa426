use uuid::Uuid;

use crate::storage::UnitOfWork;
use super::errors::InventoryError;
use super::value_objects::{Product, StockLevel};

// ============================================================================
// Inventory Ledger
// ============================================================================
//
// Stateless: every operation runs inside the caller's unit of work, so a
// reservation lives exactly as long as the surrounding storage transaction.
// `reserve` is a single conditional decrement at the storage layer, never a
// read followed by a write.
//
// ============================================================================

pub struct InventoryLedger;

impl InventoryLedger {
    /// Decrement stock by `quantity` iff at least that much is on hand.
    pub async fn reserve<U: UnitOfWork>(
        uow: &mut U,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity(quantity));
        }

        if uow.try_decrement_stock(product_id, quantity).await? {
            tracing::debug!(product_id = %product_id, quantity, "Reserved stock");
            Ok(())
        } else {
            tracing::info!(product_id = %product_id, quantity, "Reservation refused, insufficient stock");
            Err(InventoryError::InsufficientStock {
                product_id,
                requested: quantity,
            })
        }
    }

    /// Return `quantity` units to stock. Only ever increments.
    pub async fn release<U: UnitOfWork>(
        uow: &mut U,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), InventoryError> {
        if quantity <= 0 {
            return Err(InventoryError::InvalidQuantity(quantity));
        }

        if !uow.increment_stock(product_id, quantity).await? {
            return Err(InventoryError::ProductNotFound(product_id));
        }

        tracing::debug!(product_id = %product_id, quantity, "Released stock");
        Ok(())
    }

    pub async fn is_below_critical<U: UnitOfWork>(
        uow: &mut U,
        product_id: Uuid,
    ) -> Result<bool, InventoryError> {
        Ok(Self::product(uow, product_id).await?.is_below_critical())
    }

    pub async fn stock_level<U: UnitOfWork>(
        uow: &mut U,
        product_id: Uuid,
    ) -> Result<StockLevel, InventoryError> {
        Ok(StockLevel::from(&Self::product(uow, product_id).await?))
    }

    async fn product<U: UnitOfWork>(uow: &mut U, product_id: Uuid) -> Result<Product, InventoryError> {
        uow.product(product_id)
            .await?
            .ok_or(InventoryError::ProductNotFound(product_id))
    }
}

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::storage::{Store, UnitOfWork};
use super::errors::CartError;
use super::value_objects::{CartItem, CartQuantity};

// ============================================================================
// Cart Service
// ============================================================================
//
// Plain CRUD over a user's own lines. Lines are private per user, so no
// cross-user coordination is needed beyond the (user, product) key.
//
// ============================================================================

pub struct CartService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> CartService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Add `count` units, merging into an existing line for the same product.
    /// The increment happens in storage, so concurrent adds never overwrite each other.
    pub async fn add(&self, user_id: Uuid, product_id: Uuid, count: i32) -> Result<CartItem, CartError> {
        let count = CartQuantity::new(count)?;
        let mut uow = self.store.begin().await?;

        Self::ensure_purchasable(&mut uow, product_id).await?;

        let Some(item) = uow.merge_cart_line(user_id, product_id, count, Utc::now()).await? else {
            let held = uow.cart_line(user_id, product_id).await?.map_or(0, |line| line.count.get());
            return Err(CartError::QuantityOutOfRange(held + count.get()));
        };
        uow.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            product_id = %product_id,
            count = item.count.get(),
            "Cart line saved"
        );

        Ok(item)
    }

    /// Overwrite the count of an existing line.
    pub async fn update(&self, user_id: Uuid, product_id: Uuid, count: i32) -> Result<CartItem, CartError> {
        let count = CartQuantity::new(count)?;
        let mut uow = self.store.begin().await?;

        let existing = uow
            .cart_line(user_id, product_id)
            .await?
            .ok_or(CartError::LineNotFound(product_id))?;

        let item = CartItem { count, ..existing };
        uow.put_cart_line(&item).await?;
        uow.commit().await?;

        Ok(item)
    }

    pub async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<(), CartError> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_cart_line(user_id, product_id).await? {
            return Err(CartError::LineNotFound(product_id));
        }
        uow.commit().await?;
        Ok(())
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<u64, CartError> {
        let mut uow = self.store.begin().await?;
        let removed = uow.clear_cart(user_id).await?;
        uow.commit().await?;
        Ok(removed)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<CartItem>, CartError> {
        let mut uow = self.store.begin().await?;
        let lines = uow.cart_lines(user_id).await?;
        uow.rollback().await?;
        Ok(lines)
    }

    async fn ensure_purchasable(uow: &mut S::Unit, product_id: Uuid) -> Result<(), CartError> {
        let product = uow
            .product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        if !product.is_active {
            return Err(CartError::InactiveProduct(product_id));
        }
        Ok(())
    }
}

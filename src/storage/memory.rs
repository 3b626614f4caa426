use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::cart::{CartItem, CartQuantity};
use crate::domain::inventory::Product;
use crate::domain::ledger::{Transaction, TransactionType};
use crate::domain::order::{Order, OrderRecord, OrderStatus};
use crate::domain::returns::OrderReturn;
use super::{AuditRecord, Store, StoreError, UnitOfWork};

// ============================================================================
// In-memory Store
// ============================================================================
//
// One async mutex guards the committed state. A unit of work owns the guard
// for its whole lifetime and edits a private copy; `commit` swaps the copy
// in. Units are therefore fully serialised, which makes every stock
// movement linearizable, and an uncommitted unit leaves no trace.
//
// Used by the test-suite and by `storage.backend: memory`.
//
// ============================================================================

#[derive(Clone, Default)]
struct MemoryState {
    products: HashMap<Uuid, Product>,
    cart: BTreeMap<(Uuid, Uuid), CartItem>,
    orders: HashMap<Uuid, Order>,
    transactions: HashMap<Uuid, Transaction>,
    returns: HashMap<Uuid, OrderReturn>,
    audit: Vec<AuditRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog-side upsert of a product row
    pub async fn put_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    pub async fn product(&self, product_id: Uuid) -> Option<Product> {
        self.state.lock().await.products.get(&product_id).cloned()
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<Self::Unit, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnit { guard, working })
    }
}

pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn product(&mut self, product_id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.working.products.get(&product_id).cloned())
    }

    async fn try_decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, StoreError> {
        match self.working.products.get_mut(&product_id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, StoreError> {
        match self.working.products.get_mut(&product_id) {
            Some(product) => {
                product.stock = product
                    .stock
                    .checked_add(quantity)
                    .ok_or_else(|| StoreError::Corrupt(format!("stock overflow for product {}", product_id)))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        Ok(self
            .working
            .cart
            .range((user_id, Uuid::nil())..=(user_id, Uuid::from_u128(u128::MAX)))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>, StoreError> {
        Ok(self.working.cart.get(&(user_id, product_id)).cloned())
    }

    async fn put_cart_line(&mut self, item: &CartItem) -> Result<(), StoreError> {
        self.working.cart.insert((item.user_id, item.product_id), item.clone());
        Ok(())
    }

    async fn merge_cart_line(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        count: CartQuantity,
        added_at: DateTime<Utc>,
    ) -> Result<Option<CartItem>, StoreError> {
        let key = (user_id, product_id);
        match self.working.cart.get_mut(&key) {
            Some(line) => match line.count.merge(count) {
                Ok(merged) => {
                    line.count = merged;
                    Ok(Some(line.clone()))
                }
                Err(_) => Ok(None),
            },
            None => {
                let line = CartItem {
                    user_id,
                    product_id,
                    count,
                    added_at,
                };
                self.working.cart.insert(key, line.clone());
                Ok(Some(line))
            }
        }
    }

    async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.working.cart.remove(&(user_id, product_id)).is_some())
    }

    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64, StoreError> {
        let before = self.working.cart.len();
        self.working.cart.retain(|(owner, _), _| *owner != user_id);
        Ok((before - self.working.cart.len()) as u64)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        if self.working.orders.contains_key(&order.id()) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id())));
        }
        self.working.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn order(&mut self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.working.orders.get(&order_id).cloned())
    }

    async fn lock_order(&mut self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        self.order(order_id).await
    }

    async fn update_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        let order = self
            .working
            .orders
            .get(&order_id)
            .ok_or_else(|| StoreError::Corrupt(format!("order {} vanished", order_id)))?;

        let updated = Order::restore(OrderRecord {
            id: order.id(),
            user_id: order.user_id(),
            order_date: order.order_date(),
            total_amount: order.total_amount(),
            status,
            shipping_address: order.shipping_address().to_string(),
            items: order.items().to_vec(),
        })
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        self.working.orders.insert(order_id, updated);
        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        if self.working.transactions.contains_key(&transaction.id) {
            return Err(StoreError::Conflict(format!("transaction {} already exists", transaction.id)));
        }
        if transaction.transaction_type == TransactionType::Purchase
            && self.working.transactions.values().any(|t| {
                t.order_id == transaction.order_id && t.transaction_type == TransactionType::Purchase
            })
        {
            return Err(StoreError::Conflict(format!(
                "order {} already has a purchase transaction",
                transaction.order_id
            )));
        }
        self.working.transactions.insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn transaction(&mut self, transaction_id: Uuid) -> Result<Option<Transaction>, StoreError> {
        Ok(self.working.transactions.get(&transaction_id).cloned())
    }

    async fn transactions_for_order(&mut self, order_id: Uuid) -> Result<Vec<Transaction>, StoreError> {
        let mut found: Vec<Transaction> = self
            .working
            .transactions
            .values()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| (t.transaction_date, t.id));
        Ok(found)
    }

    async fn insert_return(&mut self, order_return: &OrderReturn) -> Result<(), StoreError> {
        if self.working.returns.contains_key(&order_return.id) {
            return Err(StoreError::Conflict(format!("return {} already exists", order_return.id)));
        }
        if order_return.status.is_open()
            && self
                .working
                .returns
                .values()
                .any(|r| r.order_id == order_return.order_id && r.status.is_open())
        {
            return Err(StoreError::Conflict(format!(
                "order {} already has an open return",
                order_return.order_id
            )));
        }
        self.working.returns.insert(order_return.id, order_return.clone());
        Ok(())
    }

    async fn order_return(&mut self, return_id: Uuid) -> Result<Option<OrderReturn>, StoreError> {
        Ok(self.working.returns.get(&return_id).cloned())
    }

    async fn lock_return(&mut self, return_id: Uuid) -> Result<Option<OrderReturn>, StoreError> {
        self.order_return(return_id).await
    }

    async fn returns_for_order(&mut self, order_id: Uuid) -> Result<Vec<OrderReturn>, StoreError> {
        let mut found: Vec<OrderReturn> = self
            .working
            .returns
            .values()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        Ok(found)
    }

    async fn update_return(&mut self, order_return: &OrderReturn) -> Result<(), StoreError> {
        if let Some(refund_id) = order_return.refund_transaction_id {
            if self
                .working
                .returns
                .values()
                .any(|r| r.id != order_return.id && r.refund_transaction_id == Some(refund_id))
            {
                return Err(StoreError::Conflict(format!(
                    "refund transaction {} already linked to another return",
                    refund_id
                )));
            }
        }
        match self.working.returns.get_mut(&order_return.id) {
            Some(existing) => {
                *existing = order_return.clone();
                Ok(())
            }
            None => Err(StoreError::Corrupt(format!("return {} vanished", order_return.id))),
        }
    }

    async fn append_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError> {
        self.working.audit.push(record.clone());
        Ok(())
    }

    async fn audit_trail(&mut self, aggregate_id: Uuid) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self
            .working
            .audit
            .iter()
            .filter(|r| r.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let MemoryUnit { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

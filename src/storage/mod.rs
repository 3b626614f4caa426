// ============================================================================
// Storage Layer - Request-scoped units of work
// ============================================================================
//
// A `Store` hands out one `UnitOfWork` per ledger operation. Everything the
// operation writes goes through that handle and becomes visible together on
// `commit`; dropping the handle (or `rollback`) discards all of it.
//
// Backends:
// - PgStore     - Postgres via sqlx, stock moved by conditional UPDATEs
// - MemoryStore - in-process, units of work serialised behind one lock
//
// ============================================================================

mod memory;
mod postgres;
mod schema;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::{CartItem, CartQuantity};
use crate::domain::inventory::Product;
use crate::domain::ledger::Transaction;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::returns::OrderReturn;
use crate::lifecycle::{Aggregate, DomainEvent, EventEnvelope};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type AuditRecord = EventEnvelope<serde_json::Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Unit: UnitOfWork;

    /// Open a unit of work; its lifetime is one logical transaction.
    async fn begin(&self) -> Result<Self::Unit, StoreError>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    // Catalog (read-only)
    async fn product(&mut self, product_id: Uuid) -> Result<Option<Product>, StoreError>;

    // Inventory
    /// Atomically `stock -= quantity` iff `stock >= quantity`; false when refused or missing.
    async fn try_decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, StoreError>;
    /// `stock += quantity`; false when the product does not exist.
    async fn increment_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, StoreError>;

    // Cart
    async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartItem>, StoreError>;
    async fn cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>, StoreError>;
    async fn put_cart_line(&mut self, item: &CartItem) -> Result<(), StoreError>;
    /// Atomically insert the line or add `count` to the stored one. `None` when the
    /// merged count would exceed `CartQuantity::MAX`; the stored line is then untouched.
    async fn merge_cart_line(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        count: CartQuantity,
        added_at: DateTime<Utc>,
    ) -> Result<Option<CartItem>, StoreError>;
    async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<bool, StoreError>;
    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64, StoreError>;

    // Orders
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;
    async fn order(&mut self, order_id: Uuid) -> Result<Option<Order>, StoreError>;
    /// Like `order`, holding a row lock until the unit ends
    async fn lock_order(&mut self, order_id: Uuid) -> Result<Option<Order>, StoreError>;
    async fn update_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> Result<(), StoreError>;

    // Transactions
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError>;
    async fn transaction(&mut self, transaction_id: Uuid) -> Result<Option<Transaction>, StoreError>;
    async fn transactions_for_order(&mut self, order_id: Uuid) -> Result<Vec<Transaction>, StoreError>;

    // Returns
    async fn insert_return(&mut self, order_return: &OrderReturn) -> Result<(), StoreError>;
    async fn order_return(&mut self, return_id: Uuid) -> Result<Option<OrderReturn>, StoreError>;
    /// Like `order_return`, holding a row lock until the unit ends
    async fn lock_return(&mut self, return_id: Uuid) -> Result<Option<OrderReturn>, StoreError>;
    async fn returns_for_order(&mut self, order_id: Uuid) -> Result<Vec<OrderReturn>, StoreError>;
    async fn update_return(&mut self, order_return: &OrderReturn) -> Result<(), StoreError>;

    // Audit
    async fn append_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError>;
    async fn audit_trail(&mut self, aggregate_id: Uuid) -> Result<Vec<AuditRecord>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
    async fn rollback(self) -> Result<(), StoreError>;
}

/// Append `events` for `aggregate` to the audit trail inside `uow`.
pub async fn record_events<U, A>(
    uow: &mut U,
    aggregate: &A,
    events: Vec<A::Event>,
    correlation_id: Uuid,
    user_id: Uuid,
) -> Result<(), StoreError>
where
    U: UnitOfWork,
    A: Aggregate,
    A::Event: DomainEvent,
{
    for event in events {
        let record = EventEnvelope::new(A::AGGREGATE_TYPE, aggregate.aggregate_id(), event, correlation_id)
            .with_user(user_id)
            .into_json()?;
        uow.append_audit(&record).await?;
    }
    Ok(())
}

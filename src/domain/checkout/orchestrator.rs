use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::domain::inventory::InventoryLedger;
use crate::domain::ledger::Transaction;
use crate::domain::order::{Order, PricedLine};
use crate::metrics::Metrics;
use crate::storage::{record_events, Store, UnitOfWork};
use super::errors::CheckoutError;

// ============================================================================
// Checkout Orchestrator
// ============================================================================
//
// All-or-nothing inside one unit of work:
//   1. snapshot cart lines and live catalog prices (validation, no writes)
//   2. reserve stock per line in ascending product id order
//   3. on any refused reservation, roll the unit back (undoes the
//      reservations already made) and report InsufficientStock
//   4. insert Order + OrderItems, Purchase transaction, clear cart, audit
//   5. commit once
//
// ============================================================================

pub struct CheckoutOrchestrator<S: Store> {
    store: Arc<S>,
    metrics: Arc<Metrics>,
}

impl<S: Store> CheckoutOrchestrator<S> {
    pub fn new(store: Arc<S>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    pub async fn checkout(&self, user_id: Uuid, shipping_address: &str) -> Result<Order, CheckoutError> {
        let started = Instant::now();
        let result = self.run(user_id, shipping_address).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(CheckoutError::EmptyCart) => "empty_cart",
            Err(CheckoutError::InactiveProduct { .. } | CheckoutError::ProductNotFound { .. }) => "invalid_product",
            Err(CheckoutError::InsufficientStock { .. }) => "insufficient_stock",
            Err(CheckoutError::InvalidOrder(_)) => "invalid_order",
            Err(CheckoutError::PersistenceFailure(_)) => "persistence_failure",
        };
        self.metrics.record_checkout(outcome, started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => tracing::info!(
                order_id = %order.id(),
                user_id = %user_id,
                total = %order.total_amount(),
                items = order.items().len(),
                "Checkout committed"
            ),
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Checkout aborted"),
        }

        result
    }

    async fn run(&self, user_id: Uuid, shipping_address: &str) -> Result<Order, CheckoutError> {
        let mut uow = self.store.begin().await?;

        // 1. Snapshot
        let mut lines = uow.cart_lines(user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        lines.sort_by_key(|line| line.product_id);

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = uow
                .product(line.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound { product_id: line.product_id })?;
            if !product.is_active {
                return Err(CheckoutError::InactiveProduct { product_id: product.id });
            }
            priced.push(PricedLine {
                product_id: product.id,
                quantity: line.count.get(),
                unit_price: product.price,
            });
        }

        let (order, placed) = Order::place(user_id, shipping_address, priced)?;

        // 2-3. Reserve
        for item in order.items() {
            if let Err(e) = InventoryLedger::reserve(&mut uow, item.product_id, item.quantity).await {
                self.metrics.record_reservation_failure();
                uow.rollback().await?;
                return Err(e.into());
            }
        }

        // 4. Persist
        let purchase = Transaction::purchase(order.id(), user_id, order.total_amount());
        uow.insert_order(&order).await?;
        uow.insert_transaction(&purchase).await?;
        uow.clear_cart(user_id).await?;
        record_events(&mut uow, &order, vec![placed], Uuid::now_v7(), user_id).await?;

        let mut low_stock = Vec::new();
        for item in order.items() {
            if InventoryLedger::is_below_critical(&mut uow, item.product_id).await? {
                low_stock.push(item.product_id);
            }
        }

        // 5. Commit
        uow.commit().await?;

        for product_id in low_stock {
            tracing::warn!(product_id = %product_id, order_id = %order.id(), "Stock below critical level");
            self.metrics.record_low_stock_alert();
        }

        Ok(order)
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::Money;
use crate::lifecycle::Aggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{OrderItem, OrderStatus, PricedLine};

// ============================================================================
// Order Aggregate
// ============================================================================
//
// An Order never exists without its items and captured prices: the only
// ways to obtain one are `Order::place` (checkout) and `Order::restore`
// (storage), and both check sum(quantity × unit_price) == total_amount.
// After creation only `status` moves, through the Aggregate trait.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    id: Uuid,
    user_id: Uuid,
    order_date: DateTime<Utc>,
    total_amount: Money,
    status: OrderStatus,
    shipping_address: String,
    items: Vec<OrderItem>,
}

/// Flat persisted form of an order, handed to `Order::restore`.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Build a new Pending order from priced cart lines.
    pub fn place(
        user_id: Uuid,
        shipping_address: &str,
        lines: Vec<PricedLine>,
    ) -> Result<(Self, OrderEvent), OrderError> {
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(OrderError::MissingShippingAddress);
        }
        if lines.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        let id = Uuid::now_v7();
        let mut items: Vec<OrderItem> = lines
            .into_iter()
            .map(|line| {
                if line.quantity <= 0 {
                    return Err(OrderError::InvalidQuantity(line.quantity));
                }
                Ok(OrderItem {
                    id: Uuid::now_v7(),
                    order_id: id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
            })
            .collect::<Result<_, _>>()?;
        items.sort_by_key(|item| item.product_id);

        let total_amount = sum_items(&items)?;

        let event = OrderEvent::Placed(OrderPlaced {
            user_id,
            total_amount,
            lines: items
                .iter()
                .map(|item| PlacedLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        });

        let order = Self {
            id,
            user_id,
            order_date: Utc::now(),
            total_amount,
            status: OrderStatus::Pending,
            shipping_address: shipping_address.to_string(),
            items,
        };

        Ok((order, event))
    }

    /// Rebuild a persisted order, rejecting rows that break the total invariant.
    pub fn restore(record: OrderRecord) -> Result<Self, OrderError> {
        if record.items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        let mut items = record.items;
        items.sort_by_key(|item| item.product_id);

        let computed = sum_items(&items)?;
        if computed != record.total_amount {
            return Err(OrderError::TotalMismatch {
                recorded: record.total_amount,
                computed,
            });
        }

        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            order_date: record.order_date,
            total_amount: record.total_amount,
            status: record.status,
            shipping_address: record.shipping_address,
            items,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Items in ascending product order
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    fn transition(&self, to: OrderStatus) -> Result<(), OrderError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(OrderError::InvalidStatusTransition { from: self.status, to })
        }
    }
}

fn sum_items(items: &[OrderItem]) -> Result<Money, OrderError> {
    items.iter().try_fold(Money::ZERO, |acc, item| {
        item.subtotal()
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or(OrderError::AmountOverflow)
    })
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    const AGGREGATE_TYPE: &'static str = "Order";

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();
        match command {
            OrderCommand::MarkPaid => {
                self.transition(OrderStatus::Paid)?;
                Ok(vec![OrderEvent::Paid(OrderPaid { paid_at: now })])
            }
            OrderCommand::Ship => {
                self.transition(OrderStatus::Shipped)?;
                Ok(vec![OrderEvent::Shipped(OrderShipped { shipped_at: now })])
            }
            OrderCommand::Complete => {
                self.transition(OrderStatus::Completed)?;
                Ok(vec![OrderEvent::Completed(OrderCompleted { completed_at: now })])
            }
            OrderCommand::Cancel { reason } => {
                self.transition(OrderStatus::Cancelled)?;
                Ok(vec![OrderEvent::Cancelled(OrderCancelled {
                    reason: reason.clone(),
                    cancelled_at: now,
                })])
            }
        }
    }

    fn apply_event(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::Placed(_) => {}
            OrderEvent::Paid(_) => self.status = OrderStatus::Paid,
            OrderEvent::Shipped(_) => self.status = OrderStatus::Shipped,
            OrderEvent::Completed(_) => self.status = OrderStatus::Completed,
            OrderEvent::Cancelled(_) => self.status = OrderStatus::Cancelled,
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, unit_price: i64) -> PricedLine {
        PricedLine {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price: Money::from_minor(unit_price),
        }
    }

    fn placed() -> Order {
        Order::place(Uuid::new_v4(), "1 Main St", vec![line(2, 2_500), line(1, 5_000)])
            .unwrap()
            .0
    }

    #[test]
    fn test_place_computes_total_from_captured_prices() {
        let user_id = Uuid::new_v4();
        let (order, event) =
            Order::place(user_id, "  1 Main St ", vec![line(2, 2_500), line(1, 5_000)]).unwrap();

        assert_eq!(order.total_amount(), Money::from_minor(10_000));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.shipping_address(), "1 Main St");
        assert_eq!(order.items().len(), 2);
        assert!(order.items().iter().all(|i| i.order_id == order.id()));
        assert!(order.items().windows(2).all(|w| w[0].product_id < w[1].product_id));

        match event {
            OrderEvent::Placed(e) => {
                assert_eq!(e.user_id, user_id);
                assert_eq!(e.total_amount, Money::from_minor(10_000));
                assert_eq!(e.lines.len(), 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_place_rejects_invalid_input() {
        let user = Uuid::new_v4();
        assert!(matches!(Order::place(user, "addr", vec![]), Err(OrderError::EmptyItems)));
        assert!(matches!(
            Order::place(user, "   ", vec![line(1, 100)]),
            Err(OrderError::MissingShippingAddress)
        ));
        assert!(matches!(
            Order::place(user, "addr", vec![line(0, 100)]),
            Err(OrderError::InvalidQuantity(0))
        ));
        assert!(matches!(
            Order::place(user, "addr", vec![line(2, i64::MAX)]),
            Err(OrderError::AmountOverflow)
        ));
    }

    #[test]
    fn test_restore_checks_total_invariant() {
        let order = placed();
        let record = OrderRecord {
            id: order.id(),
            user_id: order.user_id(),
            order_date: order.order_date(),
            total_amount: Money::from_minor(1),
            status: order.status(),
            shipping_address: order.shipping_address().to_string(),
            items: order.items().to_vec(),
        };

        let err = Order::restore(record.clone()).unwrap_err();
        assert!(matches!(err, OrderError::TotalMismatch { .. }));

        let restored = Order::restore(OrderRecord {
            total_amount: order.total_amount(),
            ..record
        })
        .unwrap();
        assert_eq!(restored, order);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut order = placed();
        order.execute(&OrderCommand::MarkPaid).unwrap();
        order.execute(&OrderCommand::Ship).unwrap();
        order.execute(&OrderCommand::Complete).unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);

        let err = order.execute(&OrderCommand::Cancel { reason: None }).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidStatusTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Cancelled
            }
        ));
    }

    #[test]
    fn test_cancel_after_shipment_rejected() {
        let mut order = placed();
        order.execute(&OrderCommand::MarkPaid).unwrap();
        order.execute(&OrderCommand::Ship).unwrap();

        let result = order.handle_command(&OrderCommand::Cancel { reason: Some("late".into()) });
        assert!(matches!(result, Err(OrderError::InvalidStatusTransition { .. })));
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn test_cancel_emits_event_with_reason() {
        let mut order = placed();
        let events = order
            .execute(&OrderCommand::Cancel { reason: Some("changed mind".into()) })
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(matches!(
            &events[..],
            [OrderEvent::Cancelled(OrderCancelled { reason: Some(r), .. })] if r == "changed mind"
        ));
    }

    #[test]
    fn test_ship_requires_payment() {
        let order = placed();
        assert!(matches!(
            order.handle_command(&OrderCommand::Ship),
            Err(OrderError::InvalidStatusTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped
            })
        ));
    }
}

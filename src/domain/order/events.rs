use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;
use crate::lifecycle::DomainEvent;

// ============================================================================
// Order Events - recorded in the audit trail
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    Paid(OrderPaid),
    Shipped(OrderShipped),
    Completed(OrderCompleted),
    Cancelled(OrderCancelled),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::Paid(_) => "OrderPaid",
            OrderEvent::Shipped(_) => "OrderShipped",
            OrderEvent::Completed(_) => "OrderCompleted",
            OrderEvent::Cancelled(_) => "OrderCancelled",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Money,
}

/// Order Placed - created by checkout with captured prices
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPlaced {
    pub user_id: Uuid,
    pub total_amount: Money,
    pub lines: Vec<PlacedLine>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderPaid {
    pub paid_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderShipped {
    pub shipped_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCompleted {
    pub completed_at: DateTime<Utc>,
}

/// Order Cancelled - reserved stock goes back to inventory
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCancelled {
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;
use crate::lifecycle::DomainEvent;
use super::value_objects::ReturnReason;

// ============================================================================
// Return Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReturnEvent {
    Requested(ReturnRequested),
    Approved(ReturnApproved),
    Rejected(ReturnRejected),
    Completed(ReturnCompleted),
}

impl DomainEvent for ReturnEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReturnEvent::Requested(_) => "ReturnRequested",
            ReturnEvent::Approved(_) => "ReturnApproved",
            ReturnEvent::Rejected(_) => "ReturnRejected",
            ReturnEvent::Completed(_) => "ReturnCompleted",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReturnRequested {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub reason: ReturnReason,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReturnApproved {
    pub refund_amount: Money,
    pub admin_note: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReturnRejected {
    pub admin_note: Option<String>,
}

/// Return Completed - refund written and stock restored
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReturnCompleted {
    pub refund_transaction_id: Uuid,
    pub refund_amount: Money,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::Order;
use crate::domain::Money;
use crate::lifecycle::Aggregate;
use crate::storage::StoreError;
use super::commands::ReturnCommand;
use super::errors::ReturnError;
use super::events::*;
use super::value_objects::{ReturnReason, ReturnStatus};

// ============================================================================
// Order Return Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReturn {
    // Identity
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,

    // Request
    pub return_reason: ReturnReason,
    pub return_description: String,

    // Decision / settlement
    pub status: ReturnStatus,
    pub refund_amount: Option<Money>,
    pub admin_note: Option<String>,
    pub refund_transaction_id: Option<Uuid>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderReturn {
    /// Open a Pending return for `order`.
    ///
    /// `existing` are the returns already recorded for the same order; an open
    /// one, or one that already completed a refund, blocks a new request.
    pub fn request(
        order: &Order,
        existing: &[OrderReturn],
        user_id: Uuid,
        reason: ReturnReason,
        description: &str,
    ) -> Result<(Self, ReturnEvent), ReturnError> {
        if order.user_id() != user_id {
            return Err(ReturnError::NotOrderOwner {
                order_id: order.id(),
                user_id,
            });
        }
        if !order.status().accepts_returns() {
            return Err(ReturnError::InvalidOrderState(order.status()));
        }
        if existing
            .iter()
            .any(|r| r.status.is_open() || r.status == ReturnStatus::Completed)
        {
            return Err(ReturnError::DuplicateReturn(order.id()));
        }

        let now = Utc::now();
        let order_return = Self {
            id: Uuid::now_v7(),
            order_id: order.id(),
            user_id,
            return_reason: reason,
            return_description: description.trim().to_string(),
            status: ReturnStatus::Pending,
            refund_amount: None,
            admin_note: None,
            refund_transaction_id: None,
            created_at: now,
            updated_at: now,
        };

        let event = ReturnEvent::Requested(ReturnRequested {
            order_id: order.id(),
            user_id,
            reason,
            description: order_return.return_description.clone(),
        });

        Ok((order_return, event))
    }

    /// The amount fixed at approval. A stored Approved or Completed return without one
    /// is corrupt and never settles as a zero refund.
    pub fn approved_refund_amount(&self) -> Result<Money, ReturnError> {
        self.refund_amount.ok_or_else(|| {
            ReturnError::Store(StoreError::Corrupt(format!(
                "return {} is {} without a refund amount",
                self.id, self.status
            )))
        })
    }

    fn expect_status(&self, expected: ReturnStatus, to: ReturnStatus) -> Result<(), ReturnError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(ReturnError::InvalidStateTransition { from: self.status, to })
        }
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderReturn {
    type Event = ReturnEvent;
    type Command = ReturnCommand;
    type Error = ReturnError;

    const AGGREGATE_TYPE: &'static str = "OrderReturn";

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReturnCommand::Approve {
                refund_amount,
                admin_note,
                order_total,
            } => {
                self.expect_status(ReturnStatus::Pending, ReturnStatus::Approved)?;

                let refund_amount = refund_amount.ok_or(ReturnError::RefundAmountRequired)?;
                if !refund_amount.is_positive() {
                    return Err(ReturnError::InvalidRefundAmount(refund_amount));
                }
                if refund_amount > *order_total {
                    return Err(ReturnError::RefundAmountExceedsOrderTotal {
                        refund: refund_amount,
                        total: *order_total,
                    });
                }

                Ok(vec![ReturnEvent::Approved(ReturnApproved {
                    refund_amount,
                    admin_note: admin_note.clone(),
                })])
            }

            ReturnCommand::Reject { admin_note } => {
                self.expect_status(ReturnStatus::Pending, ReturnStatus::Rejected)?;
                Ok(vec![ReturnEvent::Rejected(ReturnRejected {
                    admin_note: admin_note.clone(),
                })])
            }

            ReturnCommand::CompleteRefund { refund_transaction_id } => {
                self.expect_status(ReturnStatus::Approved, ReturnStatus::Completed)?;
                let refund_amount = self.approved_refund_amount()?;
                Ok(vec![ReturnEvent::Completed(ReturnCompleted {
                    refund_transaction_id: *refund_transaction_id,
                    refund_amount,
                })])
            }
        }
    }

    fn apply_event(&mut self, event: &Self::Event) {
        self.updated_at = Utc::now();

        match event {
            ReturnEvent::Requested(_) => {}
            ReturnEvent::Approved(e) => {
                self.status = ReturnStatus::Approved;
                self.refund_amount = Some(e.refund_amount);
                self.admin_note = e.admin_note.clone();
            }
            ReturnEvent::Rejected(e) => {
                self.status = ReturnStatus::Rejected;
                self.admin_note = e.admin_note.clone();
            }
            ReturnEvent::Completed(e) => {
                self.status = ReturnStatus::Completed;
                self.refund_transaction_id = Some(e.refund_transaction_id);
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;

// ============================================================================
// Ledger Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Purchase,
    Refund,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "Purchase",
            TransactionType::Refund => "Refund",
            TransactionType::Adjustment => "Adjustment",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Purchase" => Ok(TransactionType::Purchase),
            "Refund" => Ok(TransactionType::Refund),
            "Adjustment" => Ok(TransactionType::Adjustment),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Failed => "Failed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TransactionStatus::Pending),
            "Completed" => Ok(TransactionStatus::Completed),
            "Failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// A ledger row. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub transaction_date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub order_id: Uuid,
    pub user_id: Uuid,
}

impl Transaction {
    /// Settlement of a freshly placed order
    pub fn purchase(order_id: Uuid, user_id: Uuid, amount: Money) -> Self {
        Self::completed(TransactionType::Purchase, order_id, user_id, amount)
    }

    /// Refund for a completed return; always a new row, never the purchase row
    pub fn refund(order_id: Uuid, user_id: Uuid, amount: Money) -> Self {
        Self::completed(TransactionType::Refund, order_id, user_id, amount)
    }

    fn completed(transaction_type: TransactionType, order_id: Uuid, user_id: Uuid, amount: Money) -> Self {
        Self {
            id: Uuid::now_v7(),
            transaction_type,
            amount,
            transaction_date: Utc::now(),
            status: TransactionStatus::Completed,
            order_id,
            user_id,
        }
    }
}

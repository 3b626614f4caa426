use uuid::Uuid;

use crate::domain::Money;

// ============================================================================
// Return Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ReturnCommand {
    Approve {
        refund_amount: Option<Money>,
        admin_note: Option<String>,
        order_total: Money,
    },
    Reject {
        admin_note: Option<String>,
    },
    CompleteRefund {
        refund_transaction_id: Uuid,
    },
}

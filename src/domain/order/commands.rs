// ============================================================================
// Order Commands - Lifecycle moves after checkout
// ============================================================================
//
// Orders are created only by the checkout orchestrator, so there is no
// create command here.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OrderCommand {
    MarkPaid,
    Ship,
    Complete,
    Cancel { reason: Option<String> },
}

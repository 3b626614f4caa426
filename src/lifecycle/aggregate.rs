use uuid::Uuid;

// ============================================================================
// Aggregate State Machine
// ============================================================================
//
// Key Principles:
// 1. Commands are validated against the current state before anything changes
// 2. A successful command yields events describing what happened
// 3. Applying an event is the only way state moves
// 4. Aggregates enforce their own transition rules
//
// Current state is persisted as rows; events are kept as the audit trail.
//
// ============================================================================

/// Generic Aggregate trait - every ledger aggregate with a lifecycle implements this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Name recorded in the audit trail, e.g. "Order"
    const AGGREGATE_TYPE: &'static str;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Apply an event to move state forward
    fn apply_event(&mut self, event: &Self::Event);

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Handle a command and apply the resulting events in one step
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command)?;
        for event in &events {
            self.apply_event(event);
        }
        Ok(events)
    }
}

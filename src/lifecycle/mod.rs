// ============================================================================
// Lifecycle Infrastructure
// ============================================================================
//
// Generic state-machine and audit abstractions shared by every aggregate.
// Domain-specific code is in src/domain/
//
// ============================================================================

mod aggregate;
mod event;

pub use aggregate::Aggregate;
pub use event::{serialize_event, DomainEvent, EventEnvelope};

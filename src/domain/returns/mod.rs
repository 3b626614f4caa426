// ============================================================================
// Returns Domain - Return request, admin decision, refund
// ============================================================================
//
// Pending → Approved → Completed
// Pending → Rejected
//
// ============================================================================

pub mod aggregate;
pub mod command_handler;
pub mod commands;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use aggregate::*;
pub use command_handler::*;
pub use commands::*;
pub use errors::*;
pub use events::*;
pub use value_objects::*;

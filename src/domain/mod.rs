// ============================================================================
// Domain Layer - Checkout & Refund Ledger
// ============================================================================
//
// Each aggregate has its own subdirectory with some of:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Command handler / service
//
// Command handlers open one storage unit of work per operation and pass it
// explicitly to everything they call.
//
// ============================================================================

pub mod errors;
pub mod value_objects;

pub mod cart;
pub mod checkout;
pub mod inventory;
pub mod ledger;
pub mod order;
pub mod returns;

pub use errors::{Classify, ErrorKind};
pub use value_objects::Money;

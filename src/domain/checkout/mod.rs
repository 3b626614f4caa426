// ============================================================================
// Checkout Domain - Cart → Order + Purchase Transaction
// ============================================================================

pub mod errors;
pub mod orchestrator;

pub use errors::*;
pub use orchestrator::*;

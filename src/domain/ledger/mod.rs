// ============================================================================
// Transaction Ledger - Monetary movements bound to orders
// ============================================================================

pub mod value_objects;

pub use value_objects::*;

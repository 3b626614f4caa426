// ============================================================================
// Inventory Domain - Stock Reservation Ledger
// ============================================================================
//
// Product rows belong to the catalog; this module only ever moves `stock`,
// and only through `InventoryLedger::reserve` / `InventoryLedger::release`.
//
// ============================================================================

pub mod errors;
pub mod ledger;
pub mod value_objects;

pub use errors::*;
pub use ledger::*;
pub use value_objects::*;

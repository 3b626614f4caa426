// ============================================================================
// Cart Domain - Per-user staging area before checkout
// ============================================================================

pub mod errors;
pub mod service;
pub mod value_objects;

pub use errors::*;
pub use service::*;
pub use value_objects::*;

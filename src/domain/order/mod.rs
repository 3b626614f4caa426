// ============================================================================
// Order Domain - Immutable purchase record with a status lifecycle
// ============================================================================
//
// - Value objects (OrderItem, OrderStatus, PricedLine)
// - Events (OrderPlaced, OrderCancelled, ...)
// - Commands (MarkPaid, Ship, Complete, Cancel)
// - Errors (OrderError)
// - Aggregate (Order, constructed only through `Order::place` / `Order::restore`)
// - Command Handler (OrderCommandHandler)
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

//! Order checkout and return/refund ledger.
//!
//! Checkout turns a cart into an order atomically with the stock
//! reservations and the purchase transaction; returns walk an approval
//! workflow that ends in a refund transaction and a restock.

pub mod api;
pub mod config;
pub mod domain;
pub mod lifecycle;
pub mod metrics;
pub mod storage;
pub mod utils;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;

// ============================================================================
// Inventory Value Objects
// ============================================================================

/// Catalog product as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub price: Money,
    pub stock: i32,
    pub critical_stock_level: i32,
    pub is_active: bool,
}

impl Product {
    pub fn is_below_critical(&self) -> bool {
        self.stock < self.critical_stock_level
    }
}

/// Stock snapshot exposed to the alerting collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub stock: i32,
    pub critical_stock_level: i32,
    pub below_critical: bool,
}

impl From<&Product> for StockLevel {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            stock: product.stock,
            critical_stock_level: product.critical_stock_level,
            below_critical: product.is_below_critical(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::CartError;

// ============================================================================
// Cart Value Objects
// ============================================================================

/// Line count, always within `[CartQuantity::MIN, CartQuantity::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct CartQuantity(i32);

impl CartQuantity {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 100;

    pub fn new(count: i32) -> Result<Self, CartError> {
        if (Self::MIN..=Self::MAX).contains(&count) {
            Ok(Self(count))
        } else {
            Err(CartError::QuantityOutOfRange(count))
        }
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// Quantity after a repeated add of the same product
    pub fn merge(self, additional: CartQuantity) -> Result<Self, CartError> {
        Self::new(self.0 + additional.0)
    }
}

impl TryFrom<i32> for CartQuantity {
    type Error = CartError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CartQuantity> for i32 {
    fn from(value: CartQuantity) -> Self {
        value.0
    }
}

/// One (user, product) line; a user has at most one line per product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub count: CartQuantity,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert!(CartQuantity::new(1).is_ok());
        assert!(CartQuantity::new(100).is_ok());
        assert!(matches!(CartQuantity::new(0), Err(CartError::QuantityOutOfRange(0))));
        assert!(matches!(CartQuantity::new(101), Err(CartError::QuantityOutOfRange(101))));
        assert!(CartQuantity::new(-5).is_err());
    }

    #[test]
    fn test_merge_stays_in_range() {
        let a = CartQuantity::new(60).unwrap();
        assert_eq!(a.merge(CartQuantity::new(40).unwrap()).unwrap().get(), 100);
        assert!(matches!(
            a.merge(CartQuantity::new(41).unwrap()),
            Err(CartError::QuantityOutOfRange(101))
        ));
    }

    #[test]
    fn test_quantity_deserialization_validates() {
        let ok: CartQuantity = serde_json::from_str("7").unwrap();
        assert_eq!(ok.get(), 7);
        assert!(serde_json::from_str::<CartQuantity>("0").is_err());
    }
}

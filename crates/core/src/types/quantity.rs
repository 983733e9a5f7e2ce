//! Bag line quantity, bounded to the range the backend accepts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of units on a single bag line.
///
/// The backend rejects quantities outside `1..=10`; this type makes the
/// bound unrepresentable rather than checked at every call site.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

/// Error constructing a [`Quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Value outside the accepted range.
    #[error("quantity {0} is out of range (1..=10)")]
    OutOfRange(u32),
}

impl Quantity {
    /// Smallest accepted quantity.
    pub const MIN: Self = Self(1);
    /// Largest accepted quantity.
    pub const MAX: Self = Self(10);

    /// Create a quantity, rejecting out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::OutOfRange`] unless `1 <= value <= 10`.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(QuantityError::OutOfRange(value))
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(1).is_ok());
        assert!(Quantity::new(10).is_ok());
        assert!(Quantity::new(11).is_err());
    }

    #[test]
    fn test_quantity_error_display() {
        let err = Quantity::new(11).unwrap_err();
        assert_eq!(err.to_string(), "quantity 11 is out of range (1..=10)");
    }

    #[test]
    fn test_quantity_serde_rejects_out_of_range() {
        let ok: Quantity = serde_json::from_str("3").expect("valid quantity");
        assert_eq!(ok.get(), 3);

        let err = serde_json::from_str::<Quantity>("0");
        assert!(err.is_err());
        let err = serde_json::from_str::<Quantity>("42");
        assert!(err.is_err());
    }

    #[test]
    fn test_quantity_serializes_as_number() {
        let qty = Quantity::new(7).expect("valid");
        assert_eq!(serde_json::to_string(&qty).expect("serialize"), "7");
    }
}

//! Status enums for orders and payments.
//!
//! The wire format uses the backend's human-facing strings (`"Net Banking"`,
//! `"Partially Refunded"`), so variants carry explicit renames where the
//! default representation does not match.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Transitions happen server-side only; the client never writes this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    Refunded,
}

impl OrderStatus {
    /// Whether the order has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Cancelled | Self::Returned | Self::Refunded
        )
    }
}

/// Payment method selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    Cod,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "Net Banking")]
    NetBanking,
    Wallet,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Cod => "COD",
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::Upi => "UPI",
            Self::NetBanking => "Net Banking",
            Self::Wallet => "Wallet",
        };
        write!(f, "{label}")
    }
}

/// Payment settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
    #[serde(rename = "Partially Refunded")]
    PartiallyRefunded,
}

/// Per-line status inside an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_names() {
        let json = serde_json::to_string(&OrderStatus::Shipped).expect("serialize");
        assert_eq!(json, "\"Shipped\"");
        let back: OrderStatus = serde_json::from_str("\"Delivered\"").expect("deserialize");
        assert_eq!(back, OrderStatus::Delivered);
    }

    #[test]
    fn test_payment_method_renames() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::NetBanking).expect("serialize"),
            "\"Net Banking\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cod).expect("serialize"),
            "\"COD\""
        );
        let back: PaymentMethod = serde_json::from_str("\"UPI\"").expect("deserialize");
        assert_eq!(back, PaymentMethod::Upi);
    }

    #[test]
    fn test_payment_status_partial_refund_rename() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PartiallyRefunded).expect("serialize"),
            "\"Partially Refunded\""
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }
}

//! Checkout totals.
//!
//! The thresholds are business constants, not configuration: free shipping
//! at a 499 subtotal, a flat 99 fee below it, and 18% GST rounded to the
//! nearest rupee.

use rust_decimal::{Decimal, RoundingStrategy};

/// Free shipping kicks in at this subtotal.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(499, 0, 0, false, 0);
/// Flat shipping fee below the threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(99, 0, 0, false, 0);
/// GST rate applied to the subtotal.
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Price breakdown shown at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub coupon_discount: Decimal,
    pub total: Decimal,
}

/// Compute checkout totals from a bag subtotal and coupon discount.
///
/// `tax` rounds half away from zero, matching how the backend displays it.
#[must_use]
pub fn checkout_totals(subtotal: Decimal, coupon_discount: Decimal) -> CheckoutTotals {
    let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        SHIPPING_FEE
    };
    let tax = (subtotal * TAX_RATE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let total = subtotal + shipping + tax - coupon_discount;

    CheckoutTotals {
        subtotal,
        shipping,
        tax,
        coupon_discount,
        total,
    }
}

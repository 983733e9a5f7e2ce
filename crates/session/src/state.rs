//! Normalized session state and the pure functions that build it from
//! server responses.
//!
//! The maps here are owned exclusively by the [`Session`](crate::Session);
//! everything external sees clones. Keying follows the backend's access
//! patterns: wishlist and bag by product id (at most one entry per product),
//! addresses and orders by their own ids.

use std::collections::HashMap;

use rust_decimal::Decimal;

use shopsync_client::{Address, BagItem, BagSummary, Order, WishlistItem};
use shopsync_core::{AddressId, CouponId, OrderId, ProductId, UserIdentity};

/// How many orders the "recent orders" strip shows.
const RECENT_ORDERS: usize = 5;

/// Coupon state derived from the bag summary.
///
/// The summary endpoint does not echo the original coupon code back, so
/// `code` and `coupon_id` are only known right after a successful
/// `apply_coupon` call; a later refresh rebuilds this record with both set
/// to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    /// The applied code, when known.
    pub code: Option<String>,
    /// Backend coupon id, when known.
    pub coupon_id: Option<CouponId>,
    /// Amount taken off the bag subtotal.
    pub discount_amount: Decimal,
    /// Bag total before the discount.
    pub cart_total: Decimal,
    /// Bag total after the discount.
    pub new_total: Decimal,
    /// Display message from the backend, or a generic one.
    pub message: String,
}

/// All session-scoped server-backed state.
///
/// Created empty at login, populated by refresh, cleared wholesale at
/// logout.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub user: Option<UserIdentity>,
    pub wishlist: HashMap<ProductId, WishlistItem>,
    pub bag: HashMap<ProductId, BagItem>,
    pub bag_summary: Option<BagSummary>,
    pub applied_coupon: Option<AppliedCoupon>,
    pub addresses: HashMap<AddressId, Address>,
    pub default_address_id: Option<AddressId>,
    pub orders: HashMap<OrderId, Order>,
    pub recent_orders: Vec<Order>,
}

impl SessionState {
    /// Sum of `price_when_added * quantity` over all bag lines.
    pub fn bag_subtotal(&self) -> Decimal {
        self.bag
            .values()
            .map(|item| item.price_when_added * Decimal::from(item.quantity.get()))
            .sum()
    }

    /// Find a bag line by its own id (lines are keyed by product id).
    pub fn bag_item_by_id(&self, id: &shopsync_core::BagItemId) -> Option<&BagItem> {
        self.bag.values().find(|item| &item.id == id)
    }
}

// =============================================================================
// Merge helpers (wholesale replacement, per refresh)
// =============================================================================

/// Build the wishlist map, keyed by product id.
pub(crate) fn build_wishlist_map(items: Vec<WishlistItem>) -> HashMap<ProductId, WishlistItem> {
    items
        .into_iter()
        .map(|item| (item.product.id.clone(), item))
        .collect()
}

/// Build the bag map, keyed by product id.
pub(crate) fn build_bag_map(items: Vec<BagItem>) -> HashMap<ProductId, BagItem> {
    items
        .into_iter()
        .map(|item| (item.product.id.clone(), item))
        .collect()
}

/// Build the address map and derive the default pointer.
///
/// If the server hands back more than one default (a data inconsistency),
/// the last one in the list wins.
pub(crate) fn build_address_map(
    addresses: Vec<Address>,
) -> (HashMap<AddressId, Address>, Option<AddressId>) {
    let mut map = HashMap::with_capacity(addresses.len());
    let mut default_id = None;
    for address in addresses {
        if address.is_default {
            default_id = Some(address.id.clone());
        }
        map.insert(address.id.clone(), address);
    }
    (map, default_id)
}

/// Build the order map plus the recent-orders strip.
///
/// The server returns orders most recent first; the strip keeps the head of
/// that listing.
pub(crate) fn build_order_map(orders: Vec<Order>) -> (HashMap<OrderId, Order>, Vec<Order>) {
    let recent = orders.iter().take(RECENT_ORDERS).cloned().collect();
    let map = orders
        .into_iter()
        .map(|order| (order.id.clone(), order))
        .collect();
    (map, recent)
}

/// Derive coupon state from a bag summary.
///
/// Present iff the summary says a coupon is applied and its discount is
/// positive. The code is unknown at this point (see [`AppliedCoupon`]).
pub(crate) fn derive_applied_coupon(summary: &BagSummary) -> Option<AppliedCoupon> {
    if summary.coupon_applied && summary.coupon_discount > Decimal::ZERO {
        Some(AppliedCoupon {
            code: None,
            coupon_id: None,
            discount_amount: summary.coupon_discount,
            cart_total: summary.subtotal + summary.coupon_discount,
            new_total: summary.subtotal,
            message: "Coupon applied".to_owned(),
        })
    } else {
        None
    }
}

// =============================================================================
// Optimistic write primitives
// =============================================================================

/// Insert or remove a wishlist entry.
pub(crate) fn apply_wishlist_entry(
    state: &mut SessionState,
    product: &ProductId,
    entry: Option<WishlistItem>,
) {
    match entry {
        Some(item) => {
            state.wishlist.insert(product.clone(), item);
        }
        None => {
            state.wishlist.remove(product);
        }
    }
}

/// Insert or remove a bag line.
pub(crate) fn apply_bag_entry(
    state: &mut SessionState,
    product: &ProductId,
    entry: Option<BagItem>,
) {
    match entry {
        Some(item) => {
            state.bag.insert(product.clone(), item);
        }
        None => {
            state.bag.remove(product);
        }
    }
}

/// Insert or remove an address, keeping the default pointer consistent.
///
/// Removing the current default clears the pointer without promoting
/// another address; re-inserting a default entry restores it.
pub(crate) fn apply_address_entry(
    state: &mut SessionState,
    id: &AddressId,
    entry: Option<Address>,
) {
    match entry {
        Some(address) => {
            if address.is_default {
                state.default_address_id = Some(id.clone());
            }
            state.addresses.insert(id.clone(), address);
        }
        None => {
            state.addresses.remove(id);
            if state.default_address_id.as_ref() == Some(id) {
                state.default_address_id = None;
            }
        }
    }
}

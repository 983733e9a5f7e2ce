//! Order placement and retrieval.

use tracing::instrument;

use shopsync_client::{NewOrder, Order, ShippingAddress};
use shopsync_core::{OrderId, PaymentMethod};

use crate::outcome::Outcome;
use crate::refresh::POST_MUTATION_SETTLE;
use crate::session::Session;
use crate::state::build_order_map;

/// Input for placing an order. Line items come from the server-side bag.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_gateway: Option<String>,
    pub customer_notes: Option<String>,
}

impl Session {
    /// Place an order from the current bag.
    ///
    /// On success the returned order is inserted locally and a reconciling
    /// refresh is scheduled - the server empties the bag as part of order
    /// creation, and only the refresh reflects that.
    #[instrument(skip(self, order))]
    pub async fn create_order(&self, order: PlaceOrder) -> Outcome<Order> {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_flag) = self.inner.creating_order.try_begin() else {
            return Outcome::failed("Order placement already in progress");
        };

        let payload = NewOrder {
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            payment_gateway: order.payment_gateway,
            customer_notes: order.customer_notes,
        };

        let epoch = self.current_epoch();
        match self.inner.api.create_order(&user, payload).await {
            Ok(created) => {
                self.apply_if_current(epoch, |state| {
                    state.orders.insert(created.id.clone(), created.clone());
                    state.recent_orders.insert(0, created.clone());
                    state.recent_orders.truncate(5);
                });
                self.force_order_refresh();
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::ok_with(created, "Order placed successfully!")
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Explicitly refetch the order list, outside the full refresh cycle.
    #[instrument(skip(self))]
    pub async fn sync_orders(&self) -> Outcome<Vec<Order>> {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_flag) = self.inner.fetching_orders.try_begin() else {
            return Outcome::failed("Order fetch already in progress");
        };

        let epoch = self.current_epoch();
        match self.inner.api.fetch_orders(&user).await {
            Ok(orders) => {
                self.apply_if_current(epoch, |state| {
                    let (map, recent) = build_order_map(orders.clone());
                    state.orders = map;
                    state.recent_orders = recent;
                });
                self.force_order_refresh();
                Outcome::ok(orders)
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Fetch a single order and merge it into the local map.
    #[instrument(skip(self), fields(order = %id))]
    pub async fn fetch_order(&self, id: &OrderId) -> Outcome<Order> {
        let epoch = self.current_epoch();
        match self.inner.api.fetch_order_by_id(id).await {
            Ok(order) => {
                self.apply_if_current(epoch, |state| {
                    state.orders.insert(order.id.clone(), order.clone());
                });
                Outcome::ok(order)
            }
            Err(e) => Outcome::from_error(&e),
        }
    }
}

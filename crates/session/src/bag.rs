//! Bag operations: add, quantity changes, removal, and coupons.

use tracing::instrument;

use shopsync_client::{AddToBagRequest, BagItem};
use shopsync_core::{BagItemId, ProductId, Quantity};

use crate::outcome::Outcome;
use crate::refresh::POST_MUTATION_SETTLE;
use crate::session::Session;
use crate::state::{AppliedCoupon, apply_bag_entry, derive_applied_coupon};

/// Options for adding a product to the bag.
#[derive(Debug, Clone)]
pub struct AddToBagOptions {
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Analytics hint: which screen the add came from.
    pub added_from: Option<String>,
}

impl Default for AddToBagOptions {
    fn default() -> Self {
        Self {
            quantity: 1,
            size: None,
            color: None,
            added_from: None,
        }
    }
}

impl Session {
    /// Optimistic write primitive: insert/replace the bag line if `Some`,
    /// delete it if `None`. Synchronous, never fails, no network effect.
    pub fn set_bag_entry(&self, product: &ProductId, entry: Option<BagItem>) {
        {
            let mut state = self.lock_state();
            apply_bag_entry(&mut state, product, entry);
        }
        self.force_bag_refresh();
    }

    /// Add a product to the bag.
    ///
    /// The line is server-created (id, `price_when_added`), so the local
    /// map is updated from the response rather than an optimistic guess.
    #[instrument(skip(self, options), fields(product = %product))]
    pub async fn add_to_bag(
        &self,
        product: &ProductId,
        options: AddToBagOptions,
    ) -> Outcome<BagItem> {
        let quantity = match Quantity::new(options.quantity) {
            Ok(quantity) => quantity,
            Err(e) => return Outcome::failed(e.to_string()),
        };
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_guard) = self.inner.adding_to_bag.try_acquire(product.clone()) else {
            return Outcome::failed("Add to bag already in progress");
        };

        let request = AddToBagRequest {
            product_id: product.clone(),
            quantity,
            size: options.size,
            color: options.color,
            added_from: options.added_from,
        };

        let epoch = self.current_epoch();
        match self.inner.api.add_to_bag(&user, request).await {
            Ok(item) => {
                self.apply_if_current(epoch, |state| {
                    apply_bag_entry(state, product, Some(item.clone()));
                });
                self.force_bag_refresh();
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::ok(item)
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Change the quantity of a bag line, optimistically.
    ///
    /// Out-of-range quantities are rejected before any network call. A
    /// second update for a line already mid-update is refused.
    #[instrument(skip(self), fields(bag_item = %bag_item))]
    pub async fn set_bag_quantity(&self, bag_item: &BagItemId, quantity: u32) -> Outcome {
        let quantity = match Quantity::new(quantity) {
            Ok(quantity) => quantity,
            Err(e) => return Outcome::failed(e.to_string()),
        };
        let Some(_guard) = self.inner.updating_bag.try_acquire(bag_item.clone()) else {
            return Outcome::failed("Quantity update already in progress");
        };

        let Some(current) = self.lock_state().bag_item_by_id(bag_item).cloned() else {
            return Outcome::failed("Item is not in the bag");
        };
        let product = current.product.id.clone();
        let mut updated = current;
        updated.quantity = quantity;

        let result = self
            .with_optimistic_update(
                |state| state.bag.get(&product).cloned(),
                |state, entry| apply_bag_entry(state, &product, entry),
                Some(updated),
                self.inner.api.update_bag_item_quantity(bag_item, quantity),
            )
            .await;
        self.force_bag_refresh();

        match result {
            Ok(()) => {
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::done()
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Remove a bag line, optimistically.
    #[instrument(skip(self), fields(bag_item = %bag_item))]
    pub async fn remove_bag_item(&self, bag_item: &BagItemId) -> Outcome {
        let Some(_guard) = self.inner.deleting_bag.try_acquire(bag_item.clone()) else {
            return Outcome::failed("Removal already in progress");
        };

        let Some(current) = self.lock_state().bag_item_by_id(bag_item).cloned() else {
            return Outcome::failed("Item is not in the bag");
        };
        let product = current.product.id.clone();

        let result = self
            .with_optimistic_update(
                |state| state.bag.get(&product).cloned(),
                |state, entry| apply_bag_entry(state, &product, entry),
                None,
                self.inner.api.remove_bag_item(bag_item),
            )
            .await;
        self.force_bag_refresh();

        match result {
            Ok(()) => {
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::done()
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Apply a coupon code to the bag.
    ///
    /// This is the one moment the coupon code is known client-side; the
    /// reconciling refresh rebuilds the record from the summary, where the
    /// code is not echoed back.
    #[instrument(skip(self, code))]
    pub async fn apply_coupon(&self, code: &str) -> Outcome<AppliedCoupon> {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_flag) = self.inner.applying_coupon.try_begin() else {
            return Outcome::failed("Coupon update already in progress");
        };

        let epoch = self.current_epoch();
        match self.inner.api.apply_coupon(&user, code).await {
            Ok(summary) => {
                let coupon = derive_applied_coupon(&summary).map(|mut coupon| {
                    coupon.code = Some(code.trim().to_uppercase());
                    coupon
                });
                let Some(coupon) = coupon else {
                    return Outcome::failed("Coupon could not be applied");
                };
                self.apply_if_current(epoch, |state| {
                    state.bag_summary = Some(summary);
                    state.applied_coupon = Some(coupon.clone());
                });
                self.force_bag_refresh();
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::ok_with(coupon, "Coupon applied")
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Remove the applied coupon.
    #[instrument(skip(self))]
    pub async fn remove_coupon(&self) -> Outcome {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_flag) = self.inner.applying_coupon.try_begin() else {
            return Outcome::failed("Coupon update already in progress");
        };

        let epoch = self.current_epoch();
        match self.inner.api.remove_coupon(&user).await {
            Ok(()) => {
                self.apply_if_current(epoch, |state| {
                    state.applied_coupon = None;
                });
                self.force_bag_refresh();
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::done_with("Coupon removed")
            }
            Err(e) => Outcome::from_error(&e),
        }
    }
}

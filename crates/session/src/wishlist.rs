//! Wishlist operations.

use tracing::instrument;

use shopsync_client::WishlistItem;
use shopsync_core::ProductId;

use crate::outcome::Outcome;
use crate::refresh::POST_MUTATION_SETTLE;
use crate::session::Session;
use crate::state::apply_wishlist_entry;

impl Session {
    /// Optimistic write primitive: insert/replace the entry if `Some`,
    /// delete it if `None`. Synchronous, never fails, no network effect.
    ///
    /// Screens that build their own [`WishlistItem`] guess call this before
    /// the network mutation and roll back by re-applying their snapshot.
    pub fn set_wishlist_entry(&self, product: &ProductId, entry: Option<WishlistItem>) {
        {
            let mut state = self.lock_state();
            apply_wishlist_entry(&mut state, product, entry);
        }
        self.force_wishlist_refresh();
    }

    /// Add a product to the wishlist.
    ///
    /// The entry is server-created (id, timestamps), so the local map is
    /// updated from the response rather than an optimistic guess.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn add_to_wishlist(&self, product: &ProductId) -> Outcome<WishlistItem> {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_guard) = self.inner.toggling_wishlist.try_acquire(product.clone()) else {
            return Outcome::failed("Wishlist update already in progress");
        };

        let epoch = self.current_epoch();
        match self.inner.api.add_to_wishlist(&user, product).await {
            Ok(item) => {
                self.apply_if_current(epoch, |state| {
                    apply_wishlist_entry(state, product, Some(item.clone()));
                });
                self.force_wishlist_refresh();
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::ok(item)
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Remove a product from the wishlist, optimistically.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn remove_from_wishlist(&self, product: &ProductId) -> Outcome {
        let Some(user) = self.current_user_id() else {
            return Outcome::failed("User not authenticated");
        };
        let Some(_guard) = self.inner.toggling_wishlist.try_acquire(product.clone()) else {
            return Outcome::failed("Wishlist update already in progress");
        };

        let result = self
            .with_optimistic_update(
                |state| state.wishlist.get(product).cloned(),
                |state, entry| apply_wishlist_entry(state, product, entry),
                None,
                self.inner.api.remove_from_wishlist(&user, product),
            )
            .await;
        self.force_wishlist_refresh();

        match result {
            Ok(()) => {
                self.schedule_refresh(POST_MUTATION_SETTLE, true);
                Outcome::done()
            }
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Toggle wishlist membership. Returns whether the product is
    /// wishlisted afterwards.
    pub async fn toggle_wishlist(&self, product: &ProductId) -> Outcome<bool> {
        if self.is_in_wishlist(product) {
            let outcome = self.remove_from_wishlist(product).await;
            Outcome {
                success: outcome.success,
                message: outcome.message,
                data: outcome.success.then_some(false),
            }
        } else {
            let outcome = self.add_to_wishlist(product).await;
            Outcome {
                success: outcome.success,
                message: outcome.message,
                data: outcome.success.then_some(true),
            }
        }
    }
}

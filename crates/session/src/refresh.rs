//! The refresh engine: concurrent full refetch with a freshness window,
//! reentrancy guard, and a debounce wrapper.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::session::{Session, lock};
use crate::state::{
    build_address_map, build_bag_map, build_order_map, build_wishlist_map, derive_applied_coupon,
};

/// Skip non-forced refreshes that land within this window of the last one.
/// A rate-limit guard, not a correctness guarantee.
pub const FRESHNESS_WINDOW: Duration = Duration::from_millis(5000);

/// How long mutations wait before the reconciling refresh, so a burst of
/// quantity taps collapses into one network round.
pub const POST_MUTATION_SETTLE: Duration = Duration::from_millis(500);

impl Session {
    /// Refetch every collection and replace the local maps wholesale.
    ///
    /// The five fetches run concurrently; each one merges (or is swallowed
    /// with a warning) independently of the others, so a failed wishlist
    /// fetch never blocks the bag. A refresh already in flight makes this
    /// call a no-op - callers that need another round must schedule their
    /// own, which is what [`Session::schedule_refresh`] is for.
    #[instrument(skip(self))]
    pub async fn refresh(&self, force: bool) {
        let Some(user) = self.current_user_id() else {
            return;
        };
        let Some(_running) = self.inner.refreshing.try_begin() else {
            return;
        };

        if !force {
            let last = *lock(&self.inner.last_refresh);
            if let Some(last) = last
                && last.elapsed() < FRESHNESS_WINDOW
            {
                debug!("skipping refresh inside freshness window");
                return;
            }
        }

        let epoch = self.current_epoch();
        let api = &self.inner.api;

        tokio::join!(
            async {
                match api.fetch_wishlist(&user).await {
                    Ok(items) => {
                        self.apply_if_current(epoch, |state| {
                            state.wishlist = build_wishlist_map(items);
                        });
                    }
                    Err(e) => warn!(error = %e, "wishlist refresh failed"),
                }
            },
            async {
                match api.fetch_bag(&user).await {
                    Ok(items) => {
                        self.apply_if_current(epoch, |state| {
                            state.bag = build_bag_map(items);
                        });
                    }
                    Err(e) => warn!(error = %e, "bag refresh failed"),
                }
            },
            async {
                match api.fetch_bag_summary(&user).await {
                    Ok(summary) => {
                        self.apply_if_current(epoch, |state| {
                            state.applied_coupon = derive_applied_coupon(&summary);
                            state.bag_summary = Some(summary);
                        });
                    }
                    Err(e) => warn!(error = %e, "bag summary refresh failed"),
                }
            },
            async {
                match api.fetch_addresses(&user).await {
                    Ok(addresses) => {
                        self.apply_if_current(epoch, |state| {
                            let (map, default_id) = build_address_map(addresses);
                            state.addresses = map;
                            state.default_address_id = default_id;
                        });
                    }
                    Err(e) => warn!(error = %e, "address refresh failed"),
                }
            },
            async {
                match api.fetch_orders(&user).await {
                    Ok(orders) => {
                        self.apply_if_current(epoch, |state| {
                            let (map, recent) = build_order_map(orders);
                            state.orders = map;
                            state.recent_orders = recent;
                        });
                    }
                    Err(e) => warn!(error = %e, "order refresh failed"),
                }
            },
        );

        *lock(&self.inner.last_refresh) = Some(tokio::time::Instant::now());
    }

    /// Debounce wrapper over [`Session::refresh`].
    ///
    /// Cancels any pending timer and starts a new one, collapsing bursts of
    /// triggering events into a single refresh after the burst settles.
    pub fn schedule_refresh(&self, delay: Duration, force: bool) {
        let session = self.clone();
        let mut slot = lock(&self.inner.debounce);
        if let Some(pending) = slot.take() {
            pending.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.refresh(force).await;
        }));
    }
}

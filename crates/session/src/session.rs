//! The session handle: construction, auth lifecycle, and read access.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use shopsync_client::{Address, BagItem, BagSummary, Order, ShopApi, WishlistItem};
use shopsync_core::{AddressId, BagItemId, OrderId, ProductId, UserId, UserIdentity};

use crate::keyed_lock::{KeyedLock, OpFlag};
use crate::outcome::Outcome;
use crate::state::{AppliedCoupon, SessionState};
use crate::store::IdentityStore;
use crate::totals::{CheckoutTotals, checkout_totals};

/// Session-scoped state synchronizer.
///
/// Cheap to clone (`Arc` handle); all clones share the same state. One
/// `Session` corresponds to one signed-in user; `logout` resets it to the
/// signed-out state rather than requiring a new instance.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) api: Arc<dyn ShopApi>,
    pub(crate) identity_store: IdentityStore,
    pub(crate) state: Mutex<SessionState>,

    /// Bumped on every login and logout. Network results started under an
    /// older epoch are discarded instead of being merged.
    pub(crate) epoch: AtomicU64,

    // Refresh engine
    pub(crate) refreshing: OpFlag,
    pub(crate) last_refresh: Mutex<Option<tokio::time::Instant>>,
    pub(crate) debounce: Mutex<Option<JoinHandle<()>>>,

    // Per-row in-flight guards
    pub(crate) adding_to_bag: KeyedLock<ProductId>,
    pub(crate) updating_bag: KeyedLock<BagItemId>,
    pub(crate) deleting_bag: KeyedLock<BagItemId>,
    pub(crate) toggling_wishlist: KeyedLock<ProductId>,
    pub(crate) updating_address: KeyedLock<AddressId>,
    pub(crate) deleting_address: KeyedLock<AddressId>,

    // Singleton in-flight flags
    pub(crate) applying_coupon: OpFlag,
    pub(crate) adding_address: OpFlag,
    pub(crate) setting_default_address: OpFlag,
    pub(crate) creating_order: OpFlag,
    pub(crate) fetching_orders: OpFlag,

    // Manual-refresh triggers for memoized UI
    pub(crate) wishlist_trigger: AtomicU64,
    pub(crate) bag_trigger: AtomicU64,
    pub(crate) address_trigger: AtomicU64,
    pub(crate) order_trigger: AtomicU64,
}

/// Lock a mutex, recovering the data if a panic poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Create a signed-out session.
    ///
    /// `identity_path` is where the signed-in identity is persisted across
    /// restarts; use [`Session::restore`] at startup to pick it back up.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>, identity_path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                identity_store: IdentityStore::new(identity_path),
                state: Mutex::new(SessionState::default()),
                epoch: AtomicU64::new(0),
                refreshing: OpFlag::new(),
                last_refresh: Mutex::new(None),
                debounce: Mutex::new(None),
                adding_to_bag: KeyedLock::new(),
                updating_bag: KeyedLock::new(),
                deleting_bag: KeyedLock::new(),
                toggling_wishlist: KeyedLock::new(),
                updating_address: KeyedLock::new(),
                deleting_address: KeyedLock::new(),
                applying_coupon: OpFlag::new(),
                adding_address: OpFlag::new(),
                setting_default_address: OpFlag::new(),
                creating_order: OpFlag::new(),
                fetching_orders: OpFlag::new(),
                wishlist_trigger: AtomicU64::new(0),
                bag_trigger: AtomicU64::new(0),
                address_trigger: AtomicU64::new(0),
                order_trigger: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.inner.state)
    }

    pub(crate) fn current_epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    /// Run `f` against the state unless the epoch has moved since `epoch`
    /// was sampled. Returns whether the mutation was applied.
    pub(crate) fn apply_if_current(
        &self,
        epoch: u64,
        f: impl FnOnce(&mut SessionState),
    ) -> bool {
        let mut state = self.lock_state();
        if self.inner.epoch.load(Ordering::SeqCst) == epoch {
            f(&mut state);
            true
        } else {
            tracing::debug!("discarding result from a previous session epoch");
            false
        }
    }

    // =========================================================================
    // Auth lifecycle
    // =========================================================================

    /// Sign in and start syncing.
    ///
    /// On success the identity is persisted and an immediate forced refresh
    /// is scheduled.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Outcome<UserIdentity> {
        match self.inner.api.login(email, password).await {
            Ok(auth) => {
                let identity = UserIdentity {
                    id: auth.id,
                    name: auth.full_name,
                    email: email.trim().to_lowercase(),
                };
                self.begin_session(identity.clone()).await;
                Outcome::ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                Outcome::from_error(&e)
            }
        }
    }

    /// Create an account, sign in, and start syncing.
    #[instrument(skip(self, password))]
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Outcome<UserIdentity> {
        match self.inner.api.signup(name, email, password).await {
            Ok(auth) => {
                let identity = UserIdentity {
                    id: auth.id,
                    name: auth.full_name,
                    email: email.trim().to_lowercase(),
                };
                self.begin_session(identity.clone()).await;
                Outcome::ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "signup failed");
                Outcome::from_error(&e)
            }
        }
    }

    /// Start a password reset flow.
    pub async fn forgot_password(&self, email: &str) -> Outcome<String> {
        match self.inner.api.forgot_password(email).await {
            Ok(info) => Outcome::ok(info.message),
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Complete a password reset with the emailed token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Outcome {
        match self.inner.api.reset_password(token, new_password).await {
            Ok(()) => Outcome::done(),
            Err(e) => Outcome::from_error(&e),
        }
    }

    /// Resume the previously signed-in session, if one was persisted.
    ///
    /// Schedules an immediate forced refresh when an identity is found.
    pub async fn restore(&self) -> Option<UserIdentity> {
        match self.inner.identity_store.load().await {
            Ok(Some(identity)) => {
                self.begin_session_without_persist(identity.clone());
                Some(identity)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to load persisted identity");
                None
            }
        }
    }

    /// Sign out: clear the persisted identity and every collection.
    ///
    /// Any pending debounce timer is cancelled; any fetch still in flight
    /// will find the epoch moved and discard its result.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(e) = self.inner.identity_store.clear().await {
            warn!(error = %e, "failed to clear persisted identity");
        }
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.cancel_pending_refresh();
        self.clear_all_state();
        info!("session cleared");
    }

    async fn begin_session(&self, identity: UserIdentity) {
        if let Err(e) = self.inner.identity_store.save(&identity).await {
            warn!(error = %e, "failed to persist identity");
        }
        self.begin_session_without_persist(identity);
    }

    fn begin_session_without_persist(&self, identity: UserIdentity) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.cancel_pending_refresh();
        self.clear_all_state();
        self.lock_state().user = Some(identity);
        self.schedule_refresh(Duration::ZERO, true);
    }

    fn clear_all_state(&self) {
        *self.lock_state() = SessionState::default();
        *lock(&self.inner.last_refresh) = None;
        self.inner.wishlist_trigger.store(0, Ordering::SeqCst);
        self.inner.bag_trigger.store(0, Ordering::SeqCst);
        self.inner.address_trigger.store(0, Ordering::SeqCst);
        self.inner.order_trigger.store(0, Ordering::SeqCst);
    }

    pub(crate) fn cancel_pending_refresh(&self) {
        if let Some(handle) = lock(&self.inner.debounce).take() {
            handle.abort();
        }
    }

    // =========================================================================
    // Read access (snapshot clones; callers can never mutate the maps)
    // =========================================================================

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserIdentity> {
        self.lock_state().user.clone()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock_state().user.is_some()
    }

    pub(crate) fn current_user_id(&self) -> Option<UserId> {
        self.lock_state().user.as_ref().map(|u| u.id.clone())
    }

    /// Wishlist entries keyed by product id.
    #[must_use]
    pub fn wishlist_items(&self) -> HashMap<ProductId, WishlistItem> {
        self.lock_state().wishlist.clone()
    }

    /// Whether the product is wishlisted.
    #[must_use]
    pub fn is_in_wishlist(&self, product: &ProductId) -> bool {
        self.lock_state().wishlist.contains_key(product)
    }

    /// Bag lines keyed by product id.
    #[must_use]
    pub fn bag_items(&self) -> HashMap<ProductId, BagItem> {
        self.lock_state().bag.clone()
    }

    /// The bag line for a product, if any.
    #[must_use]
    pub fn bag_item_for(&self, product: &ProductId) -> Option<BagItem> {
        self.lock_state().bag.get(product).cloned()
    }

    /// The latest server-computed bag aggregate.
    #[must_use]
    pub fn bag_summary(&self) -> Option<BagSummary> {
        self.lock_state().bag_summary.clone()
    }

    /// Derived coupon state, present only while a coupon is applied.
    #[must_use]
    pub fn applied_coupon(&self) -> Option<AppliedCoupon> {
        self.lock_state().applied_coupon.clone()
    }

    /// Saved addresses keyed by id.
    #[must_use]
    pub fn addresses(&self) -> HashMap<AddressId, Address> {
        self.lock_state().addresses.clone()
    }

    /// Id of the default address, if one is flagged.
    #[must_use]
    pub fn default_address_id(&self) -> Option<AddressId> {
        self.lock_state().default_address_id.clone()
    }

    /// The default address record, if one is flagged.
    #[must_use]
    pub fn default_address(&self) -> Option<Address> {
        let state = self.lock_state();
        state
            .default_address_id
            .as_ref()
            .and_then(|id| state.addresses.get(id))
            .cloned()
    }

    /// Orders keyed by id.
    #[must_use]
    pub fn orders(&self) -> HashMap<OrderId, Order> {
        self.lock_state().orders.clone()
    }

    /// The most recent orders, newest first.
    #[must_use]
    pub fn recent_orders(&self) -> Vec<Order> {
        self.lock_state().recent_orders.clone()
    }

    /// A single order from the local map.
    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        self.lock_state().orders.get(id).cloned()
    }

    // =========================================================================
    // Derived aggregates
    // =========================================================================

    /// Number of bag lines.
    #[must_use]
    pub fn total_bag_items(&self) -> usize {
        self.lock_state().bag.len()
    }

    /// Number of wishlist entries.
    #[must_use]
    pub fn total_wishlist_items(&self) -> usize {
        self.lock_state().wishlist.len()
    }

    /// Number of saved addresses.
    #[must_use]
    pub fn total_addresses(&self) -> usize {
        self.lock_state().addresses.len()
    }

    /// Number of orders.
    #[must_use]
    pub fn total_orders(&self) -> usize {
        self.lock_state().orders.len()
    }

    /// Sum of `price_when_added * quantity` over all bag lines.
    #[must_use]
    pub fn bag_subtotal(&self) -> Decimal {
        self.lock_state().bag_subtotal()
    }

    /// Checkout totals for the current bag, including any coupon discount.
    #[must_use]
    pub fn bag_checkout_totals(&self) -> CheckoutTotals {
        let state = self.lock_state();
        let discount = state
            .applied_coupon
            .as_ref()
            .map(|c| c.discount_amount)
            .unwrap_or_default();
        checkout_totals(state.bag_subtotal(), discount)
    }

    // =========================================================================
    // Manual-refresh triggers (memoized UI invalidation)
    // =========================================================================

    /// Current wishlist trigger value.
    #[must_use]
    pub fn wishlist_refresh_trigger(&self) -> u64 {
        self.inner.wishlist_trigger.load(Ordering::SeqCst)
    }

    /// Current bag trigger value.
    #[must_use]
    pub fn bag_refresh_trigger(&self) -> u64 {
        self.inner.bag_trigger.load(Ordering::SeqCst)
    }

    /// Current address trigger value.
    #[must_use]
    pub fn address_refresh_trigger(&self) -> u64 {
        self.inner.address_trigger.load(Ordering::SeqCst)
    }

    /// Current order trigger value.
    #[must_use]
    pub fn order_refresh_trigger(&self) -> u64 {
        self.inner.order_trigger.load(Ordering::SeqCst)
    }

    /// Invalidate memoized wishlist views.
    pub fn force_wishlist_refresh(&self) {
        self.inner.wishlist_trigger.fetch_add(1, Ordering::SeqCst);
    }

    /// Invalidate memoized bag views.
    pub fn force_bag_refresh(&self) {
        self.inner.bag_trigger.fetch_add(1, Ordering::SeqCst);
    }

    /// Invalidate memoized address views.
    pub fn force_address_refresh(&self) {
        self.inner.address_trigger.fetch_add(1, Ordering::SeqCst);
    }

    /// Invalidate memoized order views.
    pub fn force_order_refresh(&self) {
        self.inner.order_trigger.fetch_add(1, Ordering::SeqCst);
    }

    // =========================================================================
    // In-flight flags (spinner/disabled-state rendering)
    // =========================================================================

    /// Whether a refresh round is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.refreshing.is_active()
    }

    /// Whether an add-to-bag is in flight for the product.
    #[must_use]
    pub fn is_adding_to_bag(&self, product: &ProductId) -> bool {
        self.inner.adding_to_bag.is_held(product)
    }

    /// Whether a quantity update is in flight for the bag line.
    #[must_use]
    pub fn is_updating_bag_item(&self, bag_item: &BagItemId) -> bool {
        self.inner.updating_bag.is_held(bag_item)
    }

    /// Whether a removal is in flight for the bag line.
    #[must_use]
    pub fn is_deleting_bag_item(&self, bag_item: &BagItemId) -> bool {
        self.inner.deleting_bag.is_held(bag_item)
    }

    /// Whether a wishlist toggle is in flight for the product.
    #[must_use]
    pub fn is_toggling_wishlist(&self, product: &ProductId) -> bool {
        self.inner.toggling_wishlist.is_held(product)
    }

    /// Whether a coupon apply/remove is in flight.
    #[must_use]
    pub fn is_applying_coupon(&self) -> bool {
        self.inner.applying_coupon.is_active()
    }

    /// Whether an address create is in flight.
    #[must_use]
    pub fn is_adding_address(&self) -> bool {
        self.inner.adding_address.is_active()
    }

    /// Whether an update is in flight for the address.
    #[must_use]
    pub fn is_updating_address(&self, id: &AddressId) -> bool {
        self.inner.updating_address.is_held(id)
    }

    /// Whether a deletion is in flight for the address.
    #[must_use]
    pub fn is_deleting_address(&self, id: &AddressId) -> bool {
        self.inner.deleting_address.is_held(id)
    }

    /// Whether a set-default is in flight.
    #[must_use]
    pub fn is_setting_default_address(&self) -> bool {
        self.inner.setting_default_address.is_active()
    }

    /// Whether an order placement is in flight.
    #[must_use]
    pub fn is_creating_order(&self) -> bool {
        self.inner.creating_order.is_active()
    }

    /// Whether an explicit order refetch is in flight.
    #[must_use]
    pub fn is_fetching_orders(&self) -> bool {
        self.inner.fetching_orders.is_active()
    }
}

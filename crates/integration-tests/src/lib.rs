//! Test support for driving a `Session` without a network.
//!
//! [`MockShopApi`] is an in-memory [`ShopApi`] with a mutable "server
//! truth", per-operation call counting, failure injection, and optional
//! artificial latency (so tests can overlap in-flight calls under a paused
//! tokio clock).

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use shopsync_client::{
    AddToBagRequest, Address, ApiError, ApiResult, AuthSession, BagItem, BagSummary,
    CreateAddress, NewOrder, Order, OrderItem, OrderPayment, OrderPricing, PasswordResetInfo,
    ProductRef, ProductSnapshot, Recommendation, ShippingAddress, ShopApi, TrackingEvent,
    UpdateAddress, WishlistItem,
};
use shopsync_core::{
    AddressId, BagItemId, OrderId, PaymentStatus, ProductId, Quantity, UserId, WishlistEntryId,
};

// =============================================================================
// Fixtures
// =============================================================================

/// A product reference for fixtures.
#[must_use]
pub fn product(id: &str, price: i64) -> ProductRef {
    ProductRef {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        brand: "Vastra".to_owned(),
        images: vec![format!("https://cdn.example.com/{id}.jpg")],
        price: Decimal::from(price),
        discount: None,
        rating: Some(4.2),
    }
}

/// A bag line for fixtures.
///
/// # Panics
///
/// Panics if `quantity` is out of range.
#[must_use]
pub fn bag_item(id: &str, product_id: &str, price: i64, quantity: u32) -> BagItem {
    BagItem {
        id: BagItemId::new(id),
        product: product(product_id, price),
        quantity: Quantity::new(quantity).expect("fixture quantity in range"),
        price_when_added: Decimal::from(price),
        size: None,
        color: None,
    }
}

/// A wishlist entry for fixtures.
#[must_use]
pub fn wishlist_item(id: &str, product_id: &str, price: i64) -> WishlistItem {
    WishlistItem {
        id: WishlistEntryId::new(id),
        product: product(product_id, price),
        user_id: UserId::new("u1"),
        added_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).single().expect("valid date"),
        priority: 0,
        notes: None,
        price_alert_enabled: false,
        original_price: Decimal::from(price),
        days_in_wishlist: 3,
    }
}

/// A saved address for fixtures.
#[must_use]
pub fn address(id: &str, is_default: bool) -> Address {
    Address {
        id: AddressId::new(id),
        name: format!("Recipient {id}"),
        phone: "9876543210".to_owned(),
        address_line1: "14 MG Road".to_owned(),
        address_line2: None,
        landmark: None,
        city: "Bengaluru".to_owned(),
        state: "Karnataka".to_owned(),
        pincode: "560001".to_owned(),
        is_default,
    }
}

/// A placed order for fixtures.
#[must_use]
pub fn order(id: &str, total: i64) -> Order {
    Order {
        id: OrderId::new(id),
        order_id: format!("ORD-{id}"),
        user_id: UserId::new("u1"),
        items: vec![],
        status: shopsync_core::OrderStatus::Confirmed,
        order_date: Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).single().expect("valid date"),
        expected_delivery_date: None,
        pricing: OrderPricing {
            subtotal: Decimal::from(total),
            discount: Decimal::ZERO,
            shipping: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::from(total),
        },
        shipping_address: ShippingAddress::from(&address("a1", true)),
        payment: OrderPayment {
            method: shopsync_core::PaymentMethod::Cod,
            status: PaymentStatus::Pending,
            paid_amount: Decimal::ZERO,
            transaction_id: None,
        },
        customer_notes: None,
    }
}

// =============================================================================
// Mock server state
// =============================================================================

/// The mock backend's "server truth".
#[derive(Debug, Default)]
pub struct MockState {
    pub wishlist: Vec<WishlistItem>,
    pub bag: Vec<BagItem>,
    pub addresses: Vec<Address>,
    pub orders: Vec<Order>,
    pub coupon_applied: bool,
    pub coupon_discount: Decimal,
    next_id: u32,
}

impl MockState {
    fn subtotal(&self) -> Decimal {
        self.bag
            .iter()
            .map(|item| item.price_when_added * Decimal::from(item.quantity.get()))
            .sum()
    }

    fn summary(&self) -> BagSummary {
        BagSummary {
            subtotal: self.subtotal(),
            coupon_discount: if self.coupon_applied {
                self.coupon_discount
            } else {
                Decimal::ZERO
            },
            coupon_applied: self.coupon_applied,
            total_items: u32::try_from(self.bag.len()).unwrap_or(u32::MAX),
        }
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

// =============================================================================
// MockShopApi
// =============================================================================

/// In-memory [`ShopApi`] double.
#[derive(Default)]
pub struct MockShopApi {
    state: Mutex<MockState>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    latency: Mutex<Option<Duration>>,
    /// When set, the backend "adjusts" every quantity update to this value
    /// (e.g. clamped to stock), so reconciliation can diverge from the
    /// optimistic guess.
    quantity_override: Mutex<Option<u32>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockShopApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the server truth for seeding or post-mutation assertions.
    pub fn server_state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// How many times an operation has been called.
    #[must_use]
    pub fn call_count(&self, op: &str) -> usize {
        lock(&self.calls).get(op).copied().unwrap_or(0)
    }

    /// Make an operation fail with an injected server error.
    pub fn set_failing(&self, op: &'static str, failing: bool) {
        let mut set = lock(&self.failing);
        if failing {
            set.insert(op);
        } else {
            set.remove(op);
        }
    }

    /// Add artificial latency before every operation responds.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Make the backend adjust every quantity update to a fixed value.
    pub fn set_quantity_override(&self, quantity: Option<u32>) {
        *lock(&self.quantity_override) = quantity;
    }

    async fn begin(&self, op: &'static str) -> ApiResult<()> {
        *lock(&self.calls).entry(op).or_insert(0) += 1;
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if lock(&self.failing).contains(op) {
            return Err(ApiError::Server(format!("injected failure: {op}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ShopApi for MockShopApi {
    async fn login(&self, email: &str, _password: &str) -> ApiResult<AuthSession> {
        self.begin("login").await?;
        let _ = email;
        Ok(AuthSession {
            id: UserId::new("u1"),
            full_name: "Test User".to_owned(),
        })
    }

    async fn signup(&self, name: &str, _email: &str, _password: &str) -> ApiResult<AuthSession> {
        self.begin("signup").await?;
        Ok(AuthSession {
            id: UserId::new("u1"),
            full_name: name.to_owned(),
        })
    }

    async fn forgot_password(&self, _email: &str) -> ApiResult<PasswordResetInfo> {
        self.begin("forgot_password").await?;
        Ok(PasswordResetInfo {
            message: "Reset link sent".to_owned(),
            reset_token: Some("reset-token".to_owned()),
        })
    }

    async fn reset_password(&self, _token: &str, _new_password: &str) -> ApiResult<()> {
        self.begin("reset_password").await
    }

    async fn fetch_wishlist(&self, _user: &UserId) -> ApiResult<Vec<WishlistItem>> {
        self.begin("fetch_wishlist").await?;
        Ok(lock(&self.state).wishlist.clone())
    }

    async fn add_to_wishlist(
        &self,
        user: &UserId,
        product_id: &ProductId,
    ) -> ApiResult<WishlistItem> {
        self.begin("add_to_wishlist").await?;
        let mut state = lock(&self.state);
        let id = state.fresh_id("wl");
        let mut item = wishlist_item(&id, product_id.as_str(), 500);
        item.user_id = user.clone();
        state.wishlist.push(item.clone());
        Ok(item)
    }

    async fn remove_from_wishlist(&self, _user: &UserId, product_id: &ProductId) -> ApiResult<()> {
        self.begin("remove_from_wishlist").await?;
        lock(&self.state)
            .wishlist
            .retain(|item| &item.product.id != product_id);
        Ok(())
    }

    async fn fetch_bag(&self, _user: &UserId) -> ApiResult<Vec<BagItem>> {
        self.begin("fetch_bag").await?;
        Ok(lock(&self.state).bag.clone())
    }

    async fn fetch_bag_summary(&self, _user: &UserId) -> ApiResult<BagSummary> {
        self.begin("fetch_bag_summary").await?;
        Ok(lock(&self.state).summary())
    }

    async fn add_to_bag(&self, _user: &UserId, request: AddToBagRequest) -> ApiResult<BagItem> {
        self.begin("add_to_bag").await?;
        let mut state = lock(&self.state);
        let id = state.fresh_id("bag");
        let item = BagItem {
            id: BagItemId::new(id),
            product: product(request.product_id.as_str(), 100),
            quantity: request.quantity,
            price_when_added: Decimal::from(100),
            size: request.size,
            color: request.color,
        };
        state.bag.push(item.clone());
        Ok(item)
    }

    async fn update_bag_item_quantity(
        &self,
        bag_item: &BagItemId,
        quantity: Quantity,
    ) -> ApiResult<()> {
        self.begin("update_bag_item_quantity").await?;
        let applied = match *lock(&self.quantity_override) {
            Some(q) => Quantity::new(q).map_err(|e| ApiError::Validation(e.to_string()))?,
            None => quantity,
        };
        let mut state = lock(&self.state);
        match state.bag.iter_mut().find(|item| &item.id == bag_item) {
            Some(item) => {
                item.quantity = applied;
                Ok(())
            }
            None => Err(ApiError::NotFound(format!("bag item {bag_item}"))),
        }
    }

    async fn remove_bag_item(&self, bag_item: &BagItemId) -> ApiResult<()> {
        self.begin("remove_bag_item").await?;
        lock(&self.state).bag.retain(|item| &item.id != bag_item);
        Ok(())
    }

    async fn apply_coupon(&self, _user: &UserId, _code: &str) -> ApiResult<BagSummary> {
        self.begin("apply_coupon").await?;
        let mut state = lock(&self.state);
        state.coupon_applied = true;
        if state.coupon_discount.is_zero() {
            state.coupon_discount = Decimal::from(100);
        }
        Ok(state.summary())
    }

    async fn remove_coupon(&self, _user: &UserId) -> ApiResult<()> {
        self.begin("remove_coupon").await?;
        let mut state = lock(&self.state);
        state.coupon_applied = false;
        Ok(())
    }

    async fn fetch_addresses(&self, _user: &UserId) -> ApiResult<Vec<Address>> {
        self.begin("fetch_addresses").await?;
        Ok(lock(&self.state).addresses.clone())
    }

    async fn create_address(&self, create: CreateAddress) -> ApiResult<Address> {
        self.begin("create_address").await?;
        let mut state = lock(&self.state);
        let id = state.fresh_id("addr");
        if create.is_default {
            for existing in &mut state.addresses {
                existing.is_default = false;
            }
        }
        let created = Address {
            id: AddressId::new(id),
            name: create.name,
            phone: create.phone,
            address_line1: create.address_line1,
            address_line2: create.address_line2,
            landmark: create.landmark,
            city: create.city,
            state: create.state,
            pincode: create.pincode,
            is_default: create.is_default,
        };
        state.addresses.push(created.clone());
        Ok(created)
    }

    async fn update_address(&self, id: &AddressId, update: UpdateAddress) -> ApiResult<Address> {
        self.begin("update_address").await?;
        let mut state = lock(&self.state);
        let address = state
            .addresses
            .iter_mut()
            .find(|address| &address.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("address {id}")))?;
        if let Some(name) = update.name {
            address.name = name;
        }
        if let Some(phone) = update.phone {
            address.phone = phone;
        }
        if let Some(line1) = update.address_line1 {
            address.address_line1 = line1;
        }
        if let Some(city) = update.city {
            address.city = city;
        }
        if let Some(region) = update.state {
            address.state = region;
        }
        if let Some(pincode) = update.pincode {
            address.pincode = pincode;
        }
        if let Some(is_default) = update.is_default {
            address.is_default = is_default;
        }
        Ok(address.clone())
    }

    async fn delete_address(&self, id: &AddressId) -> ApiResult<()> {
        self.begin("delete_address").await?;
        lock(&self.state).addresses.retain(|address| &address.id != id);
        Ok(())
    }

    async fn set_default_address(&self, id: &AddressId, _user: &UserId) -> ApiResult<()> {
        self.begin("set_default_address").await?;
        let mut state = lock(&self.state);
        if !state.addresses.iter().any(|address| &address.id == id) {
            return Err(ApiError::NotFound(format!("address {id}")));
        }
        for address in &mut state.addresses {
            address.is_default = &address.id == id;
        }
        Ok(())
    }

    async fn fetch_orders(&self, _user: &UserId) -> ApiResult<Vec<Order>> {
        self.begin("fetch_orders").await?;
        Ok(lock(&self.state).orders.clone())
    }

    async fn create_order(&self, user: &UserId, new_order: NewOrder) -> ApiResult<Order> {
        self.begin("create_order").await?;
        let mut state = lock(&self.state);
        if state.bag.is_empty() {
            return Err(ApiError::Validation("bag is empty".to_owned()));
        }

        let items = state
            .bag
            .iter()
            .map(|line| OrderItem {
                product_id: line.product.id.clone(),
                product_snapshot: ProductSnapshot {
                    name: line.product.name.clone(),
                    brand: line.product.brand.clone(),
                    images: line.product.images.clone(),
                },
                size: line.size.clone(),
                color: line.color.clone(),
                price: line.price_when_added,
                quantity: line.quantity.get(),
                status: shopsync_core::ItemStatus::Processing,
            })
            .collect();
        let subtotal = state.subtotal();

        let id = state.fresh_id("ord");
        let mut created = order(&id, 0);
        created.user_id = user.clone();
        created.items = items;
        created.pricing.subtotal = subtotal;
        created.pricing.total = subtotal;
        created.shipping_address = new_order.shipping_address;
        created.payment.method = new_order.payment_method;
        created.customer_notes = new_order.customer_notes;

        // Placing an order empties the bag server-side
        state.bag.clear();
        state.coupon_applied = false;
        state.orders.insert(0, created.clone());
        Ok(created)
    }

    async fn fetch_order_by_id(&self, id: &OrderId) -> ApiResult<Order> {
        self.begin("fetch_order_by_id").await?;
        lock(&self.state)
            .orders
            .iter()
            .find(|order| &order.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("order {id}")))
    }

    async fn fetch_product_recommendations(
        &self,
        product_id: &ProductId,
        _user: Option<&UserId>,
        limit: u32,
    ) -> ApiResult<Vec<Recommendation>> {
        self.begin("fetch_product_recommendations").await?;
        let recommendations = (0..limit.min(3))
            .map(|n| Recommendation {
                product: product(&format!("{product_id}-rec-{n}"), 300),
                score: Some(0.9 - f64::from(n) * 0.1),
                reason: None,
            })
            .collect();
        Ok(recommendations)
    }

    async fn track_event(&self, _event: TrackingEvent) -> ApiResult<()> {
        self.begin("track_event").await
    }
}

// =============================================================================
// Session bootstrap helpers
// =============================================================================

/// A unique identity-file path under the system temp dir.
#[must_use]
pub fn temp_identity_path() -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("shopsync-it-{}", uuid::Uuid::new_v4()))
        .join("identity.json")
}

/// Build a session over the mock, sign in, and drain the initial refresh.
///
/// # Panics
///
/// Panics if login against the mock fails.
pub async fn start_session(api: &std::sync::Arc<MockShopApi>) -> shopsync_session::Session {
    let session = shopsync_session::Session::new(
        std::sync::Arc::clone(api) as std::sync::Arc<dyn ShopApi>,
        temp_identity_path(),
    );
    let outcome = session.login("test@example.com", "pw").await;
    assert!(outcome.success, "mock login failed: {:?}", outcome.message);
    // Let the scheduled initial refresh run to completion
    tokio::time::sleep(Duration::from_millis(50)).await;
    session
}

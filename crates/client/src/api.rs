//! The consumed interface of the shop backend.
//!
//! The state synchronizer only ever talks to this trait, never to
//! [`HttpApiClient`](crate::HttpApiClient) directly, so tests can drive it
//! with an in-memory double.

use async_trait::async_trait;

use shopsync_core::{AddressId, BagItemId, OrderId, ProductId, Quantity, UserId};

use crate::error::ApiResult;
use crate::types::{
    AddToBagRequest, Address, AuthSession, BagItem, BagSummary, CreateAddress, NewOrder, Order,
    PasswordResetInfo, Recommendation, TrackingEvent, UpdateAddress, WishlistItem,
};

/// Async interface to the shop backend.
///
/// All methods are independent requests; nothing here holds client-side
/// state. Expected failure modes surface as [`ApiError`](crate::ApiError).
#[async_trait]
pub trait ShopApi: Send + Sync {
    // =========================================================================
    // Auth
    // =========================================================================

    /// Authenticate with email and password.
    async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSession>;

    /// Create an account and authenticate.
    async fn signup(&self, name: &str, email: &str, password: &str) -> ApiResult<AuthSession>;

    /// Start a password reset flow.
    async fn forgot_password(&self, email: &str) -> ApiResult<PasswordResetInfo>;

    /// Complete a password reset with the emailed token.
    async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<()>;

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Fetch the user's full wishlist.
    async fn fetch_wishlist(&self, user: &UserId) -> ApiResult<Vec<WishlistItem>>;

    /// Add a product to the wishlist.
    async fn add_to_wishlist(&self, user: &UserId, product: &ProductId)
    -> ApiResult<WishlistItem>;

    /// Remove a product from the wishlist.
    async fn remove_from_wishlist(&self, user: &UserId, product: &ProductId) -> ApiResult<()>;

    // =========================================================================
    // Bag
    // =========================================================================

    /// Fetch the user's bag lines.
    async fn fetch_bag(&self, user: &UserId) -> ApiResult<Vec<BagItem>>;

    /// Fetch the server-computed bag aggregate.
    async fn fetch_bag_summary(&self, user: &UserId) -> ApiResult<BagSummary>;

    /// Add a product to the bag.
    async fn add_to_bag(&self, user: &UserId, request: AddToBagRequest) -> ApiResult<BagItem>;

    /// Change the quantity of an existing bag line.
    async fn update_bag_item_quantity(
        &self,
        bag_item: &BagItemId,
        quantity: Quantity,
    ) -> ApiResult<()>;

    /// Remove a bag line.
    async fn remove_bag_item(&self, bag_item: &BagItemId) -> ApiResult<()>;

    /// Apply a coupon code to the bag. Returns the updated summary.
    async fn apply_coupon(&self, user: &UserId, code: &str) -> ApiResult<BagSummary>;

    /// Remove the applied coupon, if any.
    async fn remove_coupon(&self, user: &UserId) -> ApiResult<()>;

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch all saved addresses.
    async fn fetch_addresses(&self, user: &UserId) -> ApiResult<Vec<Address>>;

    /// Save a new address. Returns the created record with its id.
    async fn create_address(&self, address: CreateAddress) -> ApiResult<Address>;

    /// Update an existing address. Returns the updated record.
    async fn update_address(&self, id: &AddressId, update: UpdateAddress) -> ApiResult<Address>;

    /// Delete an address.
    async fn delete_address(&self, id: &AddressId) -> ApiResult<()>;

    /// Mark an address as the user's default. The server clears the flag on
    /// every other address.
    async fn set_default_address(&self, id: &AddressId, user: &UserId) -> ApiResult<()>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fetch the user's orders, most recent first.
    async fn fetch_orders(&self, user: &UserId) -> ApiResult<Vec<Order>>;

    /// Place an order from the current server-side bag.
    async fn create_order(&self, user: &UserId, order: NewOrder) -> ApiResult<Order>;

    /// Fetch a single order.
    async fn fetch_order_by_id(&self, id: &OrderId) -> ApiResult<Order>;

    // =========================================================================
    // Recommendations & Tracking
    // =========================================================================

    /// Fetch product recommendations for a product page.
    async fn fetch_product_recommendations(
        &self,
        product: &ProductId,
        user: Option<&UserId>,
        limit: u32,
    ) -> ApiResult<Vec<Recommendation>>;

    /// Record a browsing-history event. Callers treat this as
    /// fire-and-forget; failures are logged, never surfaced.
    async fn track_event(&self, event: TrackingEvent) -> ApiResult<()>;
}

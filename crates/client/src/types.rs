//! Wire types for the shop backend's REST API.
//!
//! These mirror the backend's JSON shapes: camelCase fields, Mongo-style
//! `_id` identifiers, and amounts as plain JSON numbers (decoded into
//! `rust_decimal::Decimal` to keep money exact).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopsync_core::{
    AddressId, BagItemId, ItemStatus, OrderId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, Quantity, UserId, WishlistEntryId,
};

// =============================================================================
// Envelope
// =============================================================================

/// The backend's uniform response wrapper.
///
/// Every endpoint returns `{ success, data?, message?, error? }`; `error`
/// carries a machine-readable code while `message` is display text.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Product Reference
// =============================================================================

/// Product fields embedded in wishlist/bag entries.
///
/// The backend populates these references server-side; they are never a
/// full product document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub rating: Option<f64>,
}

// =============================================================================
// Wishlist
// =============================================================================

/// A wishlist entry. At most one exists per product per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(rename = "_id")]
    pub id: WishlistEntryId,
    #[serde(rename = "productId")]
    pub product: ProductRef,
    pub user_id: UserId,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub price_alert_enabled: bool,
    /// Price at the moment the item was wishlisted.
    pub original_price: Decimal,
    /// Server-computed age of the entry.
    #[serde(default)]
    pub days_in_wishlist: i64,
}

// =============================================================================
// Bag
// =============================================================================

/// A line in the user's bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagItem {
    #[serde(rename = "_id")]
    pub id: BagItemId,
    #[serde(rename = "productId")]
    pub product: ProductRef,
    pub quantity: Quantity,
    /// Price at the moment the item entered the bag; line totals use this,
    /// not the product's current price.
    pub price_when_added: Decimal,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Server-computed bag aggregate. Replaced wholesale on every refresh,
/// never patched by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BagSummary {
    pub subtotal: Decimal,
    #[serde(default)]
    pub coupon_discount: Decimal,
    #[serde(default)]
    pub coupon_applied: bool,
    #[serde(default)]
    pub total_items: u32,
}

/// Request to add a product to the bag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToBagRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Analytics hint: which screen the add came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_from: Option<String>,
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Payload for creating an address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddress {
    pub user_id: UserId,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
}

/// Partial update for an address. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

// =============================================================================
// Orders
// =============================================================================

/// Address snapshot embedded in an order.
///
/// Distinct from [`Address`]: the snapshot has no id and is immutable once
/// the order exists, even if the saved address is later edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl From<&Address> for ShippingAddress {
    fn from(address: &Address) -> Self {
        Self {
            name: address.name.clone(),
            phone: address.phone.clone(),
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            landmark: address.landmark.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            pincode: address.pincode.clone(),
        }
    }
}

/// Product fields frozen into an order line at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A line inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub product_snapshot: ProductSnapshot,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub status: ItemStatus,
}

/// Server-computed order pricing breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricing {
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Payment details on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// A placed order. Immutable from the client's perspective; status
/// transitions happen server-side only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// Human-facing order number (e.g. "ORD-2025-004821").
    pub order_id: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub pricing: OrderPricing,
    pub shipping_address: ShippingAddress,
    pub payment: OrderPayment,
    #[serde(default)]
    pub customer_notes: Option<String>,
}

impl Order {
    /// Grand total charged for the order.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.pricing.total
    }

    /// Number of lines in the order.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Payload for placing an order. Line items come from the server-side bag,
/// not from the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Successful login/signup response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub full_name: String,
}

/// Response to a forgot-password request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetInfo {
    pub message: String,
    /// Present only in non-production environments.
    #[serde(default)]
    pub reset_token: Option<String>,
}

// =============================================================================
// Recommendations & Tracking
// =============================================================================

/// A recommended product with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub product: ProductRef,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Payload of the recommendations endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// Where a tracked browsing event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    RecommendationCarousel,
    RecommendationClick,
    ProductView,
    Search,
}

/// Fire-and-forget browsing-history event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub session_id: String,
    pub source: EventSource,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bag_item_json() -> &'static str {
        r#"{
            "_id": "bag-1",
            "productId": {
                "_id": "prod-1",
                "name": "Linen Kurta",
                "brand": "Vastra",
                "images": ["https://cdn.example.com/p1.jpg"],
                "price": 1299,
                "discount": 10
            },
            "quantity": 2,
            "priceWhenAdded": 1169,
            "size": "M"
        }"#
    }

    #[test]
    fn test_bag_item_decodes_wire_shape() {
        let item: BagItem = serde_json::from_str(sample_bag_item_json()).expect("decode");
        assert_eq!(item.id.as_str(), "bag-1");
        assert_eq!(item.product.id.as_str(), "prod-1");
        assert_eq!(item.quantity.get(), 2);
        assert_eq!(item.price_when_added, Decimal::from(1169));
        assert_eq!(item.size.as_deref(), Some("M"));
        assert_eq!(item.color, None);
    }

    #[test]
    fn test_bag_item_rejects_out_of_range_quantity() {
        let json = sample_bag_item_json().replace("\"quantity\": 2", "\"quantity\": 12");
        assert!(serde_json::from_str::<BagItem>(&json).is_err());
    }

    #[test]
    fn test_bag_summary_defaults() {
        let summary: BagSummary =
            serde_json::from_str(r#"{"subtotal": 450}"#).expect("decode");
        assert_eq!(summary.subtotal, Decimal::from(450));
        assert_eq!(summary.coupon_discount, Decimal::ZERO);
        assert!(!summary.coupon_applied);
    }

    #[test]
    fn test_envelope_with_error_code() {
        let envelope: ApiEnvelope<Vec<Address>> = serde_json::from_str(
            r#"{"success": false, "message": "bad pincode", "error": "VALIDATION_ERROR"}"#,
        )
        .expect("decode");
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("VALIDATION_ERROR"));
    }

    #[test]
    fn test_shipping_address_from_saved_address() {
        let address = Address {
            id: AddressId::new("addr-1"),
            name: "Asha Rao".to_owned(),
            phone: "9876543210".to_owned(),
            address_line1: "14 MG Road".to_owned(),
            address_line2: None,
            landmark: Some("Opp. Metro".to_owned()),
            city: "Bengaluru".to_owned(),
            state: "Karnataka".to_owned(),
            pincode: "560001".to_owned(),
            is_default: true,
        };

        let snapshot = ShippingAddress::from(&address);
        assert_eq!(snapshot.name, "Asha Rao");
        assert_eq!(snapshot.pincode, "560001");
    }

    #[test]
    fn test_update_address_skips_unset_fields() {
        let update = UpdateAddress {
            city: Some("Pune".to_owned()),
            ..UpdateAddress::default()
        };
        let json = serde_json::to_string(&update).expect("serialize");
        assert_eq!(json, r#"{"city":"Pune"}"#);
    }

    #[test]
    fn test_tracking_event_snake_case_source() {
        let event = TrackingEvent {
            product_id: ProductId::new("prod-9"),
            user_id: None,
            session_id: "session_abc".to_owned(),
            source: EventSource::RecommendationCarousel,
            metadata: Value::Null,
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"recommendation_carousel\""));
        assert!(!json.contains("userId"));
        assert!(!json.contains("metadata"));
    }
}

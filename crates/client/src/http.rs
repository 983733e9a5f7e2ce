//! REST client for the shop backend.
//!
//! Thin `reqwest` wrapper: every call goes through [`HttpApiClient::decode`],
//! which maps HTTP status codes and the backend's response envelope into the
//! [`ApiError`] taxonomy.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use shopsync_core::{AddressId, BagItemId, OrderId, ProductId, Quantity, UserId};

use crate::api::ShopApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    AddToBagRequest, Address, ApiEnvelope, AuthSession, BagItem, BagSummary, CreateAddress,
    NewOrder, Order, PasswordResetInfo, Recommendation, RecommendationResponse, TrackingEvent,
    UpdateAddress, WishlistItem,
};

// =============================================================================
// HttpApiClient
// =============================================================================

/// Production [`ShopApi`] implementation over HTTPS.
#[derive(Clone)]
pub struct HttpApiClient {
    inner: Arc<HttpApiClientInner>,
}

struct HttpApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
}

impl HttpApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpApiClientInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.inner.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Decode a response into the envelope's payload.
    ///
    /// Reads the body as text first so failures can be logged with context.
    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> ApiResult<T> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth);
        }

        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            let message = envelope_message(&body).unwrap_or_else(|| what.to_owned());
            return Err(ApiError::NotFound(message));
        }

        if status.is_client_error() {
            let message = envelope_message(&body)
                .unwrap_or_else(|| truncated(&body, 200));
            return Err(ApiError::Validation(message));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncated(&body, 500),
                "backend returned non-success status"
            );
            return Err(ApiError::Server(format!("HTTP {status}")));
        }

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncated(&body, 500),
                    "failed to parse backend response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        if !envelope.success {
            return Err(envelope_error(envelope.message, envelope.error));
        }

        envelope
            .data
            .ok_or_else(|| ApiError::Malformed(format!("{what}: envelope has no data")))
    }

    /// Like [`Self::decode`] but for endpoints whose envelope carries no data.
    async fn decode_unit(&self, response: reqwest::Response, what: &str) -> ApiResult<()> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth);
        }

        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            let message = envelope_message(&body).unwrap_or_else(|| what.to_owned());
            return Err(ApiError::NotFound(message));
        }

        if status.is_client_error() {
            let message = envelope_message(&body)
                .unwrap_or_else(|| truncated(&body, 200));
            return Err(ApiError::Validation(message));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncated(&body, 500),
                "backend returned non-success status"
            );
            return Err(ApiError::Server(format!("HTTP {status}")));
        }

        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(envelope_error(envelope.message, envelope.error));
        }

        Ok(())
    }
}

/// Extract the display message from an envelope body, if it parses.
fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
}

/// Build the error for an envelope with `success: false`.
fn envelope_error(message: Option<String>, code: Option<String>) -> ApiError {
    let message = message
        .or_else(|| code.as_deref().map(|c| crate::error::user_message_for_code(c).to_owned()))
        .unwrap_or_else(|| "request rejected".to_owned());
    ApiError::Validation(message)
}

fn truncated(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

// =============================================================================
// ShopApi implementation
// =============================================================================

#[async_trait]
impl ShopApi for HttpApiClient {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/api/user/login"))
            .json(&json!({
                "email": email.trim().to_lowercase(),
                "password": password,
            }))
            .send()
            .await?;
        self.decode(response, "login").await
    }

    #[instrument(skip(self, password))]
    async fn signup(&self, name: &str, email: &str, password: &str) -> ApiResult<AuthSession> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/api/user/signup"))
            .json(&json!({
                "fullName": name.trim(),
                "email": email.trim().to_lowercase(),
                "password": password,
            }))
            .send()
            .await?;
        self.decode(response, "signup").await
    }

    #[instrument(skip(self))]
    async fn forgot_password(&self, email: &str) -> ApiResult<PasswordResetInfo> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/api/user/forgot-password"))
            .json(&json!({ "email": email.trim().to_lowercase() }))
            .send()
            .await?;
        self.decode(response, "forgot password").await
    }

    #[instrument(skip(self, token, new_password))]
    async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<()> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/api/user/reset-password"))
            .json(&json!({ "token": token, "newPassword": new_password }))
            .send()
            .await?;
        self.decode_unit(response, "reset password").await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_wishlist(&self, user: &UserId) -> ApiResult<Vec<WishlistItem>> {
        let path = format!("/api/wishlist/user/{user}");
        let request = self.inner.client.get(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode(response, "wishlist").await
    }

    #[instrument(skip(self), fields(user = %user, product = %product))]
    async fn add_to_wishlist(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> ApiResult<WishlistItem> {
        let path = format!("/api/wishlist/add/{user}");
        let request = self
            .inner
            .client
            .post(self.endpoint(&path))
            .json(&json!({ "productId": product }));
        let response = self.authorize(request).send().await?;
        self.decode(response, "add to wishlist").await
    }

    #[instrument(skip(self), fields(user = %user, product = %product))]
    async fn remove_from_wishlist(&self, user: &UserId, product: &ProductId) -> ApiResult<()> {
        let path = format!("/api/wishlist/remove/{user}/{product}");
        let request = self.inner.client.delete(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode_unit(response, "remove from wishlist").await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_bag(&self, user: &UserId) -> ApiResult<Vec<BagItem>> {
        let path = format!("/api/bag/user/{user}");
        let request = self.inner.client.get(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode(response, "bag").await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_bag_summary(&self, user: &UserId) -> ApiResult<BagSummary> {
        let path = format!("/api/bag/summary/{user}");
        let request = self.inner.client.get(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode(response, "bag summary").await
    }

    #[instrument(skip(self, request), fields(user = %user, product = %request.product_id))]
    async fn add_to_bag(&self, user: &UserId, request: AddToBagRequest) -> ApiResult<BagItem> {
        let path = format!("/api/bag/add/{user}");
        let builder = self.inner.client.post(self.endpoint(&path)).json(&request);
        let response = self.authorize(builder).send().await?;
        self.decode(response, "add to bag").await
    }

    #[instrument(skip(self), fields(bag_item = %bag_item, quantity = quantity.get()))]
    async fn update_bag_item_quantity(
        &self,
        bag_item: &BagItemId,
        quantity: Quantity,
    ) -> ApiResult<()> {
        let path = format!("/api/bag/item/{bag_item}");
        let request = self
            .inner
            .client
            .put(self.endpoint(&path))
            .json(&json!({ "quantity": quantity }));
        let response = self.authorize(request).send().await?;
        self.decode_unit(response, "update bag quantity").await
    }

    #[instrument(skip(self), fields(bag_item = %bag_item))]
    async fn remove_bag_item(&self, bag_item: &BagItemId) -> ApiResult<()> {
        let path = format!("/api/bag/item/{bag_item}");
        let request = self.inner.client.delete(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode_unit(response, "remove bag item").await
    }

    #[instrument(skip(self, code), fields(user = %user))]
    async fn apply_coupon(&self, user: &UserId, code: &str) -> ApiResult<BagSummary> {
        let path = format!("/api/coupon/apply/{user}");
        let request = self
            .inner
            .client
            .post(self.endpoint(&path))
            .json(&json!({ "code": code.trim().to_uppercase() }));
        let response = self.authorize(request).send().await?;
        self.decode(response, "apply coupon").await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn remove_coupon(&self, user: &UserId) -> ApiResult<()> {
        let path = format!("/api/coupon/remove/{user}");
        let request = self.inner.client.delete(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode_unit(response, "remove coupon").await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_addresses(&self, user: &UserId) -> ApiResult<Vec<Address>> {
        let path = format!("/api/address/user/{user}");
        let request = self.inner.client.get(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode(response, "addresses").await
    }

    #[instrument(skip(self, address), fields(user = %address.user_id))]
    async fn create_address(&self, address: CreateAddress) -> ApiResult<Address> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/api/address/create"))
            .json(&address);
        let response = self.authorize(request).send().await?;
        self.decode(response, "create address").await
    }

    #[instrument(skip(self, update), fields(address = %id))]
    async fn update_address(&self, id: &AddressId, update: UpdateAddress) -> ApiResult<Address> {
        let path = format!("/api/address/{id}");
        let request = self.inner.client.put(self.endpoint(&path)).json(&update);
        let response = self.authorize(request).send().await?;
        self.decode(response, "update address").await
    }

    #[instrument(skip(self), fields(address = %id))]
    async fn delete_address(&self, id: &AddressId) -> ApiResult<()> {
        let path = format!("/api/address/{id}");
        let request = self.inner.client.delete(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode_unit(response, "delete address").await
    }

    #[instrument(skip(self), fields(address = %id, user = %user))]
    async fn set_default_address(&self, id: &AddressId, user: &UserId) -> ApiResult<()> {
        let path = format!("/api/address/default/{id}");
        let request = self
            .inner
            .client
            .put(self.endpoint(&path))
            .json(&json!({ "userId": user }));
        let response = self.authorize(request).send().await?;
        self.decode_unit(response, "set default address").await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_orders(&self, user: &UserId) -> ApiResult<Vec<Order>> {
        let path = format!("/api/order/user/{user}");
        let request = self.inner.client.get(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode(response, "orders").await
    }

    #[instrument(skip(self, order), fields(user = %user))]
    async fn create_order(&self, user: &UserId, order: NewOrder) -> ApiResult<Order> {
        let path = format!("/api/order/create/{user}");
        let request = self.inner.client.post(self.endpoint(&path)).json(&order);
        let response = self.authorize(request).send().await?;
        self.decode(response, "create order").await
    }

    #[instrument(skip(self), fields(order = %id))]
    async fn fetch_order_by_id(&self, id: &OrderId) -> ApiResult<Order> {
        let path = format!("/api/order/{id}");
        let request = self.inner.client.get(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        self.decode(response, "order").await
    }

    #[instrument(skip(self), fields(product = %product))]
    async fn fetch_product_recommendations(
        &self,
        product: &ProductId,
        user: Option<&UserId>,
        limit: u32,
    ) -> ApiResult<Vec<Recommendation>> {
        let mut path = format!("/api/recommendations/product/{product}?limit={limit}");
        if let Some(user) = user {
            path.push_str(&format!("&userId={user}"));
        }
        let request = self.inner.client.get(self.endpoint(&path));
        let response = self.authorize(request).send().await?;
        let payload: RecommendationResponse = self.decode(response, "recommendations").await?;
        debug!(count = payload.recommendations.len(), "received recommendations");
        Ok(payload.recommendations)
    }

    #[instrument(skip(self, event), fields(product = %event.product_id))]
    async fn track_event(&self, event: TrackingEvent) -> ApiResult<()> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/api/browsing-history/track"))
            .json(&event);
        let response = self.authorize(request).send().await?;
        self.decode_unit(response, "track event").await
    }
}

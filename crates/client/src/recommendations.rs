//! Product recommendations with in-memory caching and view/click tracking.
//!
//! Recommendations are read-mostly catalog data, so they are cached via
//! `moka` (5-minute TTL). Browsing-history tracking is fire-and-forget:
//! failures are logged at `warn` and never surfaced to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use serde_json::json;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use shopsync_core::{ProductId, UserId};

use crate::api::ShopApi;
use crate::error::ApiResult;
use crate::types::{EventSource, Recommendation, TrackingEvent};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Cached recommendation reader for product pages.
#[derive(Clone)]
pub struct Recommendations {
    inner: Arc<RecommendationsInner>,
}

struct RecommendationsInner {
    api: Arc<dyn ShopApi>,
    cache: Cache<String, Vec<Recommendation>>,
    /// Anonymous tracking-session id, stable for the life of this service.
    session_id: String,
}

impl Recommendations {
    /// Create a new recommendations service.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(RecommendationsInner {
                api,
                cache,
                session_id: format!("session_{}", Uuid::new_v4()),
            }),
        }
    }

    /// Fetch recommendations for a product, using the cache when possible.
    ///
    /// Entries without a usable product reference are dropped. A successful
    /// uncached fetch records a carousel-view event in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails on a cache miss.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn for_product(
        &self,
        product: &ProductId,
        user: Option<&UserId>,
        limit: u32,
    ) -> ApiResult<Vec<Recommendation>> {
        let cache_key = format!(
            "{product}:{}:{limit}",
            user.map(UserId::as_str).unwrap_or_default()
        );

        if let Some(cached) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for recommendations");
            return Ok(cached);
        }

        let fetched = self
            .inner
            .api
            .fetch_product_recommendations(product, user, limit)
            .await?;

        let valid: Vec<Recommendation> = fetched
            .into_iter()
            .filter(|rec| !rec.product.name.is_empty())
            .collect();

        self.inner.cache.insert(cache_key, valid.clone()).await;

        if !valid.is_empty() {
            self.track_view(product, user);
        }

        Ok(valid)
    }

    /// Record that the carousel was shown for a product.
    fn track_view(&self, product: &ProductId, user: Option<&UserId>) {
        self.spawn_track(TrackingEvent {
            product_id: product.clone(),
            user_id: user.cloned(),
            session_id: self.inner.session_id.clone(),
            source: EventSource::RecommendationCarousel,
            metadata: json!({
                "platform": "cli",
                "timestamp": Utc::now().to_rfc3339(),
            }),
        });
    }

    /// Record a click on a recommended product.
    pub fn track_click(
        &self,
        clicked: &ProductId,
        from: &ProductId,
        index: usize,
        user: Option<&UserId>,
    ) {
        self.spawn_track(TrackingEvent {
            product_id: clicked.clone(),
            user_id: user.cloned(),
            session_id: self.inner.session_id.clone(),
            source: EventSource::RecommendationClick,
            metadata: json!({
                "platform": "cli",
                "recommendationIndex": index,
                "fromProduct": from,
                "clickedAt": Utc::now().to_rfc3339(),
            }),
        });
    }

    /// Invalidate all cached recommendations.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }

    fn spawn_track(&self, event: TrackingEvent) {
        let api = Arc::clone(&self.inner.api);
        tokio::spawn(async move {
            if let Err(e) = api.track_event(event).await {
                warn!(error = %e, "failed to track browsing event");
            }
        });
    }
}

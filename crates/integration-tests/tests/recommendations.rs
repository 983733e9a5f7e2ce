//! Recommendations service: caching and fire-and-forget tracking.

use std::sync::Arc;
use std::time::Duration;

use shopsync_client::Recommendations;
use shopsync_core::{ProductId, UserId};
use shopsync_integration_tests::MockShopApi;

#[tokio::test(start_paused = true)]
async fn test_second_read_hits_the_cache() {
    let api = Arc::new(MockShopApi::new());
    let service = Recommendations::new(api.clone());
    let product = ProductId::new("p1");

    let first = service
        .for_product(&product, None, 6)
        .await
        .expect("first fetch");
    assert_eq!(first.len(), 3);
    let second = service
        .for_product(&product, None, 6)
        .await
        .expect("cached fetch");
    assert_eq!(second.len(), 3);

    assert_eq!(api.call_count("fetch_product_recommendations"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_view_is_tracked_in_background() {
    let api = Arc::new(MockShopApi::new());
    let service = Recommendations::new(api.clone());

    service
        .for_product(&ProductId::new("p1"), Some(&UserId::new("u1")), 6)
        .await
        .expect("fetch");

    // Tracking is spawned, not awaited; give it a beat to run
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(api.call_count("track_event"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tracking_failure_is_swallowed() {
    let api = Arc::new(MockShopApi::new());
    api.set_failing("track_event", true);
    let service = Recommendations::new(api.clone());

    let result = service.for_product(&ProductId::new("p1"), None, 6).await;
    assert!(result.is_ok());

    tokio::time::sleep(Duration::from_millis(10)).await;
    // The failure was logged and dropped; nothing surfaced
    assert_eq!(api.call_count("track_event"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_click_tracking_fires() {
    let api = Arc::new(MockShopApi::new());
    let service = Recommendations::new(api.clone());

    service.track_click(
        &ProductId::new("p1-rec-0"),
        &ProductId::new("p1"),
        0,
        Some(&UserId::new("u1")),
    );

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(api.call_count("track_event"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_propagates() {
    let api = Arc::new(MockShopApi::new());
    api.set_failing("fetch_product_recommendations", true);
    let service = Recommendations::new(api.clone());

    let result = service.for_product(&ProductId::new("p1"), None, 6).await;
    assert!(result.is_err());
}

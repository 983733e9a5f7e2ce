//! Refresh engine: freshness window, reentrancy, partial failure,
//! debounce, and post-logout epoch discarding.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use shopsync_core::{AddressId, ProductId};
use shopsync_integration_tests::{
    MockShopApi, address, bag_item, order, start_session, wishlist_item,
};

fn seeded_api() -> Arc<MockShopApi> {
    let api = Arc::new(MockShopApi::new());
    {
        let mut state = api.server_state();
        state.wishlist = vec![wishlist_item("wl-1", "p1", 999)];
        state.bag = vec![bag_item("bag-1", "p2", 450, 2)];
        state.addresses = vec![address("a1", true), address("a2", false)];
        state.orders = vec![order("o1", 1200), order("o2", 750)];
    }
    api
}

#[tokio::test(start_paused = true)]
async fn test_refresh_populates_every_collection() {
    let api = seeded_api();
    let session = start_session(&api).await;

    assert_eq!(session.total_wishlist_items(), 1);
    assert_eq!(session.total_bag_items(), 1);
    assert_eq!(session.total_addresses(), 2);
    assert_eq!(session.total_orders(), 2);
    assert_eq!(session.default_address_id(), Some(AddressId::new("a1")));
    assert!(session.is_in_wishlist(&ProductId::new("p1")));
    assert_eq!(session.bag_subtotal(), Decimal::from(900));
    assert_eq!(session.recent_orders().len(), 2);
    assert!(session.bag_summary().is_some());
    // No coupon on the summary, so no derived coupon
    assert!(session.applied_coupon().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unforced_refresh_within_window_is_one_round() {
    let api = seeded_api();
    let session = start_session(&api).await;

    // Step out of the initial refresh's freshness window
    tokio::time::sleep(Duration::from_secs(6)).await;
    let base = api.call_count("fetch_bag");

    session.refresh(false).await;
    session.refresh(false).await;

    assert_eq!(api.call_count("fetch_bag"), base + 1);
    assert_eq!(api.call_count("fetch_wishlist"), base + 1);
}

#[tokio::test(start_paused = true)]
async fn test_forced_refresh_bypasses_window() {
    let api = seeded_api();
    let session = start_session(&api).await;

    let base = api.call_count("fetch_bag");
    session.refresh(true).await;
    session.refresh(true).await;

    assert_eq!(api.call_count("fetch_bag"), base + 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refresh_is_a_noop() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_latency(Some(Duration::from_millis(100)));

    let base = api.call_count("fetch_bag");
    tokio::join!(session.refresh(true), session.refresh(true));

    // The second call found a refresh in flight and did nothing
    assert_eq!(api.call_count("fetch_bag"), base + 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_leaves_previous_collection_intact() {
    let api = seeded_api();
    let session = start_session(&api).await;
    assert_eq!(session.total_wishlist_items(), 1);

    // Wishlist starts failing; the server's bag also changes
    api.set_failing("fetch_wishlist", true);
    {
        let mut state = api.server_state();
        state.bag.push(bag_item("bag-2", "p3", 199, 1));
    }

    session.refresh(true).await;

    // Stale-but-present wishlist, refreshed bag
    assert_eq!(session.total_wishlist_items(), 1);
    assert_eq!(session.total_bag_items(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_schedule_refresh_coalesces_bursts() {
    let api = seeded_api();
    let session = start_session(&api).await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    let base = api.call_count("fetch_bag");

    session.schedule_refresh(Duration::from_millis(100), true);
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.schedule_refresh(Duration::from_millis(100), true);
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.schedule_refresh(Duration::from_millis(100), true);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(api.call_count("fetch_bag"), base + 1);
}

#[tokio::test(start_paused = true)]
async fn test_logout_discards_in_flight_refresh() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_latency(Some(Duration::from_millis(100)));

    let refresher = {
        let session = session.clone();
        tokio::spawn(async move { session.refresh(true).await })
    };
    // Let the refresh get in flight, then sign out under it
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.logout().await;
    refresher.await.expect("refresh task");

    // The late responses found a newer epoch and were discarded
    assert_eq!(session.total_bag_items(), 0);
    assert_eq!(session.total_wishlist_items(), 0);
    assert_eq!(session.total_addresses(), 0);
    assert_eq!(session.total_orders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_without_user_is_a_noop() {
    let api = seeded_api();
    let session = shopsync_session::Session::new(
        Arc::clone(&api) as Arc<dyn shopsync_client::ShopApi>,
        shopsync_integration_tests::temp_identity_path(),
    );

    session.refresh(true).await;
    assert_eq!(api.call_count("fetch_bag"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_multiple_server_defaults_last_wins() {
    let api = Arc::new(MockShopApi::new());
    {
        let mut state = api.server_state();
        state.addresses = vec![address("a1", true), address("a2", true), address("a3", true)];
    }
    let session = start_session(&api).await;

    assert_eq!(session.default_address_id(), Some(AddressId::new("a3")));
}

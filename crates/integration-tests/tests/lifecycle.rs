//! Session lifecycle: login, identity restore, logout clearing, orders,
//! and checkout totals seen through the session.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use shopsync_client::{ShippingAddress, ShopApi};
use shopsync_core::PaymentMethod;
use shopsync_integration_tests::{
    MockShopApi, address, bag_item, order, start_session, temp_identity_path, wishlist_item,
};
use shopsync_session::{PlaceOrder, Session};

fn seeded_api() -> Arc<MockShopApi> {
    let api = Arc::new(MockShopApi::new());
    {
        let mut state = api.server_state();
        state.wishlist = vec![wishlist_item("wl-1", "p1", 999)];
        state.bag = vec![bag_item("bag-1", "p2", 450, 1)];
        state.addresses = vec![address("a1", true)];
        state.orders = vec![order("o1", 1200)];
    }
    api
}

#[tokio::test(start_paused = true)]
async fn test_logout_clears_every_collection() {
    let api = seeded_api();
    let session = start_session(&api).await;
    session.force_bag_refresh();
    assert!(session.is_authenticated());
    assert_eq!(session.total_bag_items(), 1);
    assert!(session.bag_refresh_trigger() > 0);

    session.logout().await;

    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
    assert_eq!(session.total_wishlist_items(), 0);
    assert_eq!(session.total_bag_items(), 0);
    assert_eq!(session.total_addresses(), 0);
    assert_eq!(session.total_orders(), 0);
    assert_eq!(session.default_address_id(), None);
    assert!(session.bag_summary().is_none());
    assert!(session.applied_coupon().is_none());
    assert!(session.recent_orders().is_empty());
    assert_eq!(session.bag_refresh_trigger(), 0);
    assert_eq!(session.wishlist_refresh_trigger(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restore_resumes_persisted_identity() {
    let api = seeded_api();
    let path = temp_identity_path();

    let first = Session::new(Arc::clone(&api) as Arc<dyn ShopApi>, path.clone());
    let outcome = first.login("test@example.com", "pw").await;
    assert!(outcome.success);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // A fresh process: new session over the same identity file
    let second = Session::new(Arc::clone(&api) as Arc<dyn ShopApi>, path);
    let restored = second.restore().await.expect("persisted identity");
    assert_eq!(restored.email, "test@example.com");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(second.is_authenticated());
    assert_eq!(second.total_bag_items(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restore_without_identity_is_signed_out() {
    let api = seeded_api();
    let session = Session::new(Arc::clone(&api) as Arc<dyn ShopApi>, temp_identity_path());
    assert!(session.restore().await.is_none());
    assert!(!session.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_triggers_increment_on_force() {
    let api = seeded_api();
    let session = start_session(&api).await;

    let before = session.address_refresh_trigger();
    session.force_address_refresh();
    session.force_address_refresh();
    assert_eq!(session.address_refresh_trigger(), before + 2);
}

#[tokio::test(start_paused = true)]
async fn test_checkout_totals_through_session() {
    let api = Arc::new(MockShopApi::new());
    api.server_state().bag = vec![bag_item("bag-1", "p1", 450, 1)];
    let session = start_session(&api).await;

    let totals = session.bag_checkout_totals();
    assert_eq!(totals.subtotal, Decimal::from(450));
    assert_eq!(totals.shipping, Decimal::from(99));
    assert_eq!(totals.tax, Decimal::from(81));
    assert_eq!(totals.total, Decimal::from(450 + 99 + 81));

    // Push the subtotal over the free-shipping threshold
    let line = session
        .bag_item_for(&shopsync_core::ProductId::new("p1"))
        .expect("line present")
        .id;
    assert!(session.set_bag_quantity(&line, 2).await.success);
    let totals = session.bag_checkout_totals();
    assert_eq!(totals.subtotal, Decimal::from(900));
    assert_eq!(totals.shipping, Decimal::ZERO);
    assert_eq!(totals.tax, Decimal::from(162));
}

#[tokio::test(start_paused = true)]
async fn test_create_order_inserts_locally_and_bag_empties_on_reconcile() {
    let api = seeded_api();
    let session = start_session(&api).await;
    assert_eq!(session.total_bag_items(), 1);

    let shipping = ShippingAddress::from(&address("a1", true));
    let outcome = session
        .create_order(PlaceOrder {
            shipping_address: shipping,
            payment_method: PaymentMethod::Cod,
            payment_gateway: None,
            customer_notes: Some("leave at the door".to_owned()),
        })
        .await;

    assert!(outcome.success);
    let placed = outcome.data.expect("order data");
    assert_eq!(session.total_orders(), 2);
    assert_eq!(
        session.recent_orders().first().map(|o| o.id.clone()),
        Some(placed.id)
    );

    // The server emptied the bag; the reconciling refresh reflects that
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(session.total_bag_items(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_create_order_with_empty_bag_fails() {
    let api = Arc::new(MockShopApi::new());
    let session = start_session(&api).await;

    let outcome = session
        .create_order(PlaceOrder {
            shipping_address: ShippingAddress::from(&address("a1", true)),
            payment_method: PaymentMethod::Upi,
            payment_gateway: Some("razorpay".to_owned()),
            customer_notes: None,
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(session.total_orders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sync_orders_merges_listing() {
    let api = seeded_api();
    let session = start_session(&api).await;

    api.server_state().orders.insert(0, order("o2", 300));
    let outcome = session.sync_orders().await;

    assert!(outcome.success);
    assert_eq!(session.total_orders(), 2);
    assert_eq!(
        session.recent_orders().first().map(|o| o.id.as_str().to_owned()),
        Some("o2".to_owned())
    );
}

//! Bag mutations: invariants, optimistic updates with rollback,
//! per-row in-flight guards, and coupon state.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use shopsync_core::{BagItemId, ProductId};
use shopsync_integration_tests::{MockShopApi, bag_item, start_session};
use shopsync_session::AddToBagOptions;

fn seeded_api() -> Arc<MockShopApi> {
    let api = Arc::new(MockShopApi::new());
    api.server_state().bag = vec![
        bag_item("bag-1", "p1", 450, 2),
        bag_item("bag-2", "p2", 199, 1),
    ];
    api
}

fn quantity_of(session: &shopsync_session::Session, product: &str) -> u32 {
    session
        .bag_item_for(&ProductId::new(product))
        .map(|item| item.quantity.get())
        .expect("bag line present")
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_quantity_rejected_without_network() {
    let api = seeded_api();
    let session = start_session(&api).await;

    for bad in [0, 11] {
        let outcome = session
            .set_bag_quantity(&BagItemId::new("bag-1"), bad)
            .await;
        assert!(!outcome.success);
    }
    assert_eq!(api.call_count("update_bag_item_quantity"), 0);
    assert_eq!(quantity_of(&session, "p1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_quantity_update_is_visible_before_the_server_responds() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_latency(Some(Duration::from_millis(100)));

    let updater = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .set_bag_quantity(&BagItemId::new("bag-1"), 5)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Network call still in flight; the optimistic write already landed
    assert!(session.is_updating_bag_item(&BagItemId::new("bag-1")));
    assert_eq!(quantity_of(&session, "p1"), 5);

    let outcome = updater.await.expect("updater task");
    assert!(outcome.success);
    assert_eq!(quantity_of(&session, "p1"), 5);
}

#[tokio::test(start_paused = true)]
async fn test_failed_update_rolls_back_to_snapshot() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_failing("update_bag_item_quantity", true);

    let outcome = session.set_bag_quantity(&BagItemId::new("bag-1"), 7).await;

    assert!(!outcome.success);
    assert_eq!(quantity_of(&session, "p1"), 2);
    assert_eq!(session.bag_subtotal(), Decimal::from(450 * 2 + 199));
}

#[tokio::test(start_paused = true)]
async fn test_reconcile_adopts_server_adjusted_value() {
    let api = seeded_api();
    let session = start_session(&api).await;
    // Server clamps every quantity update (e.g. to available stock)
    api.set_quantity_override(Some(5));

    let outcome = session.set_bag_quantity(&BagItemId::new("bag-1"), 7).await;
    assert!(outcome.success);
    // Optimistic guess first...
    assert_eq!(quantity_of(&session, "p1"), 7);

    // ...server truth after the reconciling refresh settles
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(quantity_of(&session, "p1"), 5);
}

#[tokio::test(start_paused = true)]
async fn test_second_update_on_same_row_is_refused() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_latency(Some(Duration::from_millis(100)));

    let id = BagItemId::new("bag-1");
    let (first, second) = tokio::join!(
        session.set_bag_quantity(&id, 3),
        session.set_bag_quantity(&id, 4)
    );

    assert!(first.success);
    assert!(!second.success);
    assert_eq!(api.call_count("update_bag_item_quantity"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_different_rows_update_independently() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_latency(Some(Duration::from_millis(100)));

    let id1 = BagItemId::new("bag-1");
    let id2 = BagItemId::new("bag-2");
    let (first, second) = tokio::join!(
        session.set_bag_quantity(&id1, 3),
        session.set_bag_quantity(&id2, 4)
    );

    assert!(first.success);
    assert!(second.success);
    assert_eq!(api.call_count("update_bag_item_quantity"), 2);
    assert_eq!(quantity_of(&session, "p1"), 3);
    assert_eq!(quantity_of(&session, "p2"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_remove_bag_item_rolls_back_on_failure() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_failing("remove_bag_item", true);

    let outcome = session.remove_bag_item(&BagItemId::new("bag-2")).await;

    assert!(!outcome.success);
    assert_eq!(session.total_bag_items(), 2);
    assert_eq!(quantity_of(&session, "p2"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_subtotal_tracks_adds_updates_and_removes() {
    let api = Arc::new(MockShopApi::new());
    let session = start_session(&api).await;
    assert_eq!(session.bag_subtotal(), Decimal::ZERO);

    // Add two products (mock prices every add at 100)
    let added = session
        .add_to_bag(&ProductId::new("p1"), AddToBagOptions::default())
        .await;
    assert!(added.success);
    let second = session
        .add_to_bag(
            &ProductId::new("p2"),
            AddToBagOptions {
                quantity: 3,
                ..AddToBagOptions::default()
            },
        )
        .await;
    assert!(second.success);
    assert_eq!(session.bag_subtotal(), Decimal::from(100 + 300));

    // Raise p1 to 2 units
    let p1_line = session
        .bag_item_for(&ProductId::new("p1"))
        .expect("p1 line")
        .id;
    assert!(session.set_bag_quantity(&p1_line, 2).await.success);
    assert_eq!(session.bag_subtotal(), Decimal::from(200 + 300));

    // Drop p2 entirely
    let p2_line = session
        .bag_item_for(&ProductId::new("p2"))
        .expect("p2 line")
        .id;
    assert!(session.remove_bag_item(&p2_line).await.success);
    assert_eq!(session.bag_subtotal(), Decimal::from(200));

    // And the server agrees after everything settles
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(session.bag_subtotal(), Decimal::from(200));
}

#[tokio::test(start_paused = true)]
async fn test_coupon_code_known_at_apply_unknown_after_refresh() {
    let api = seeded_api();
    let session = start_session(&api).await;

    let outcome = session.apply_coupon("SAVE100").await;
    assert!(outcome.success);
    let coupon = outcome.data.expect("coupon data");
    assert_eq!(coupon.code.as_deref(), Some("SAVE100"));
    assert_eq!(coupon.discount_amount, Decimal::from(100));

    // The reconciling refresh rebuilds the record from the summary, which
    // does not echo the code back
    tokio::time::sleep(Duration::from_millis(600)).await;
    let reconciled = session.applied_coupon().expect("coupon still applied");
    assert_eq!(reconciled.code, None);
    assert_eq!(reconciled.discount_amount, Decimal::from(100));
    let subtotal = Decimal::from(450 * 2 + 199);
    assert_eq!(reconciled.cart_total, subtotal + Decimal::from(100));
    assert_eq!(reconciled.new_total, subtotal);
}

#[tokio::test(start_paused = true)]
async fn test_remove_coupon_clears_derived_state() {
    let api = seeded_api();
    let session = start_session(&api).await;

    assert!(session.apply_coupon("SAVE100").await.success);
    assert!(session.remove_coupon().await.success);
    assert!(session.applied_coupon().is_none());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(session.applied_coupon().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_coupon_operations_are_exclusive() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_latency(Some(Duration::from_millis(100)));

    let (first, second) = tokio::join!(
        session.apply_coupon("SAVE100"),
        session.apply_coupon("OTHER50")
    );

    assert!(first.success);
    assert!(!second.success);
    assert_eq!(api.call_count("apply_coupon"), 1);
}

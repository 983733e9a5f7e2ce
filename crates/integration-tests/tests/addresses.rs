//! Address mutations: the single-default invariant, deletion semantics,
//! and optimistic rollback.

use std::sync::Arc;
use std::time::Duration;

use shopsync_core::AddressId;
use shopsync_integration_tests::{MockShopApi, address, start_session};
use shopsync_session::AddressInput;

fn seeded_api() -> Arc<MockShopApi> {
    let api = Arc::new(MockShopApi::new());
    api.server_state().addresses = vec![address("a1", true), address("a2", false)];
    api
}

fn input(is_default: bool) -> AddressInput {
    AddressInput {
        name: "Asha Rao".to_owned(),
        phone: "9876543210".to_owned(),
        address_line1: "221B Residency Road".to_owned(),
        address_line2: None,
        landmark: Some("Near the bakery".to_owned()),
        city: "Bengaluru".to_owned(),
        state: "Karnataka".to_owned(),
        pincode: "560025".to_owned(),
        is_default,
    }
}

fn count_defaults(session: &shopsync_session::Session) -> usize {
    session
        .addresses()
        .values()
        .filter(|address| address.is_default)
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_set_default_leaves_exactly_one_default() {
    let api = seeded_api();
    let session = start_session(&api).await;
    assert_eq!(session.default_address_id(), Some(AddressId::new("a1")));

    let outcome = session.set_default_address(&AddressId::new("a2")).await;
    assert!(outcome.success);

    assert_eq!(session.default_address_id(), Some(AddressId::new("a2")));
    assert_eq!(count_defaults(&session), 1);
    assert!(
        session
            .addresses()
            .get(&AddressId::new("a2"))
            .expect("a2 present")
            .is_default
    );
}

#[tokio::test(start_paused = true)]
async fn test_delete_default_clears_pointer_without_promotion() {
    let api = seeded_api();
    let session = start_session(&api).await;

    let outcome = session.delete_address(&AddressId::new("a1")).await;
    assert!(outcome.success);

    assert_eq!(session.default_address_id(), None);
    assert_eq!(session.total_addresses(), 1);
    assert_eq!(count_defaults(&session), 0);

    // Still true after the reconciling refresh
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(session.default_address_id(), None);
}

#[tokio::test(start_paused = true)]
async fn test_failed_delete_restores_address_and_pointer() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_failing("delete_address", true);

    let outcome = session.delete_address(&AddressId::new("a1")).await;

    assert!(!outcome.success);
    assert_eq!(session.total_addresses(), 2);
    assert_eq!(session.default_address_id(), Some(AddressId::new("a1")));
}

#[tokio::test(start_paused = true)]
async fn test_create_default_address_updates_pointer() {
    let api = seeded_api();
    let session = start_session(&api).await;

    let outcome = session.create_address(input(true)).await;
    assert!(outcome.success);
    let created = outcome.data.expect("created address");

    assert_eq!(session.default_address_id(), Some(created.id.clone()));
    assert_eq!(session.total_addresses(), 3);

    // Server agrees once the refresh settles: exactly one default remains
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(count_defaults(&session), 1);
    assert_eq!(session.default_address_id(), Some(created.id));
}

#[tokio::test(start_paused = true)]
async fn test_create_non_default_keeps_existing_pointer() {
    let api = seeded_api();
    let session = start_session(&api).await;

    let outcome = session.create_address(input(false)).await;
    assert!(outcome.success);
    assert_eq!(session.default_address_id(), Some(AddressId::new("a1")));
}

#[tokio::test(start_paused = true)]
async fn test_update_rolls_back_on_failure() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_failing("update_address", true);

    let update = shopsync_client::UpdateAddress {
        city: Some("Pune".to_owned()),
        ..shopsync_client::UpdateAddress::default()
    };
    let outcome = session.update_address(&AddressId::new("a2"), update).await;

    assert!(!outcome.success);
    assert_eq!(
        session
            .addresses()
            .get(&AddressId::new("a2"))
            .expect("a2 present")
            .city,
        "Bengaluru"
    );
}

#[tokio::test(start_paused = true)]
async fn test_update_applies_server_record() {
    let api = seeded_api();
    let session = start_session(&api).await;

    let update = shopsync_client::UpdateAddress {
        city: Some("Pune".to_owned()),
        ..shopsync_client::UpdateAddress::default()
    };
    let outcome = session.update_address(&AddressId::new("a2"), update).await;

    assert!(outcome.success);
    assert_eq!(
        session
            .addresses()
            .get(&AddressId::new("a2"))
            .expect("a2 present")
            .city,
        "Pune"
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_delete_same_address_refused() {
    let api = seeded_api();
    let session = start_session(&api).await;
    api.set_latency(Some(Duration::from_millis(100)));

    let id = AddressId::new("a2");
    let (first, second) = tokio::join!(session.delete_address(&id), session.delete_address(&id));

    assert!(first.success);
    assert!(!second.success);
    assert_eq!(api.call_count("delete_address"), 1);
}

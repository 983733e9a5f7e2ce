//! Shopsync Session - the client-side state synchronizer.
//!
//! # Architecture
//!
//! A [`Session`] is the single owner of every server-backed collection the
//! app renders: wishlist, bag, addresses, and orders, each held as a
//! normalized map keyed by entity id. It is created at login, torn down at
//! logout, and injected into collaborators by handle (cheap `Arc` clone) -
//! never ambient global state.
//!
//! - **Refresh engine**: [`Session::refresh`] fetches all collections
//!   concurrently and replaces each local map wholesale as its fetch
//!   settles. A 5-second freshness window and a reentrancy flag keep bursts
//!   from producing redundant rounds; [`Session::schedule_refresh`] is the
//!   debounce wrapper above it.
//! - **Optimistic mutations**: every mutation snapshots the previous value,
//!   applies the local write immediately, awaits the network call, and rolls
//!   back on failure. The server stays the source of truth - a reconciling
//!   refresh follows every successful mutation.
//! - **In-flight guards**: per-row keyed locks reject duplicate concurrent
//!   mutations of the same entity; singleton flags cover one-at-a-time
//!   operations. Both are exposed so UI can render spinner/disabled state.
//! - **Session epoch**: login and logout bump an epoch counter; any network
//!   result that started under an older epoch is discarded instead of
//!   resurrecting stale data into a new user's state.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopsync_client::{ClientConfig, HttpApiClient};
//! use shopsync_session::Session;
//!
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(HttpApiClient::new(&config)?);
//! let session = Session::new(api, config.identity_path.clone());
//!
//! session.login("asha@example.com", "hunter2!").await;
//! session.refresh(true).await;
//! println!("{} items in bag", session.total_bag_items());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod address;
mod bag;
mod keyed_lock;
mod optimistic;
mod orders;
mod outcome;
mod refresh;
mod session;
mod state;
mod store;
mod totals;
mod wishlist;

pub use address::AddressInput;
pub use bag::AddToBagOptions;
pub use keyed_lock::{KeyedGuard, KeyedLock, OpFlag, OpFlagGuard};
pub use orders::PlaceOrder;
pub use outcome::Outcome;
pub use refresh::{FRESHNESS_WINDOW, POST_MUTATION_SETTLE};
pub use session::Session;
pub use state::AppliedCoupon;
pub use store::{IdentityStore, StoreError};
pub use totals::{
    CheckoutTotals, FREE_SHIPPING_THRESHOLD, SHIPPING_FEE, TAX_RATE, checkout_totals,
};

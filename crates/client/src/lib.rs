//! Shopsync Client - REST API surface of the shop backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth; every response is a uniform JSON
//!   envelope `{ success, data, message, error }` over HTTPS
//! - [`ShopApi`] is the consumed interface: an async trait so the state
//!   synchronizer can be driven by a test double
//! - [`HttpApiClient`] is the production implementation over `reqwest`
//! - Product recommendations are cached in-memory via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use shopsync_client::{ClientConfig, HttpApiClient, ShopApi};
//!
//! let config = ClientConfig::from_env()?;
//! let client = HttpApiClient::new(&config)?;
//!
//! let auth = client.login("asha@example.com", "hunter2!").await?;
//! let bag = client.fetch_bag(&auth.id).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod api;
mod config;
mod error;
mod http;
mod recommendations;
pub mod types;

pub use api::ShopApi;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ApiResult, user_message_for_code};
pub use http::HttpApiClient;
pub use recommendations::Recommendations;
pub use types::*;

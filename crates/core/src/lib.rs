//! Shopsync Core - Shared types library.
//!
//! This crate provides common types used across all Shopsync components:
//! - `client` - REST API client for the shop backend
//! - `session` - Client-side state synchronizer
//! - `cli` - Command-line tool for exercising a session
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, quantities, identities,
//!   and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

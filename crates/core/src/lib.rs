//! House Core - Shared types library.
//!
//! This crate provides common types used across all House client components:
//! - `client` - Cart, favorites, watch-later, search-history and currency state
//! - future binaries (companion bot, tooling) that need the same domain types
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, product snapshots, cart items, and currency codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

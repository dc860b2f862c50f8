//! House client state synchronization layer.
//!
//! This crate holds the session's working copy of user-specific collections
//! (cart, favorites, watch-later, search history) and keeps them loosely
//! synchronized with the hosted backend, plus the currency rate cache used
//! to display prices in the user's selected currency.
//!
//! # Architecture
//!
//! - The hosted backend is the source of truth - stores hold an optimistic
//!   working copy and roll back on failed remote calls
//! - All remote access goes through the [`gateway::RemoteGateway`] trait;
//!   [`gateway::RestGateway`] is the production adapter
//! - Local persistence and cross-tab notification are behind the traits in
//!   [`sync`], so the mechanism is swappable outside a browser-like host
//!
//! # Example
//!
//! ```rust,ignore
//! use house_client::{ClientState, config::ClientConfig};
//! use house_core::UserId;
//!
//! let config = ClientConfig::from_env()?;
//! let state = ClientState::new(config, UserId::new("…"))?;
//!
//! state.cart().fetch().await?;
//! state.cart().add_to_cart(product, 2).await?;
//! let subtotal = state.cart().get_total();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod currency;
pub mod error;
pub mod gateway;
pub mod state;
pub mod stores;
pub mod sync;

pub use error::{ClientError, Result};
pub use state::ClientState;

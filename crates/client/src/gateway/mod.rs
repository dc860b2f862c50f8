//! Remote data gateway - the hosted backend's query API.
//!
//! # Architecture
//!
//! - The backend owns durable state for carts, favorites and watch-later
//!   lists, keyed by `(user, product)`; this layer holds an optimistic
//!   working copy
//! - All access goes through the [`RemoteGateway`] trait so stores can be
//!   exercised against a mock; [`RestGateway`] is the production adapter
//! - No batch or transactional guarantees are assumed: every call is an
//!   independent last-write-wins operation
//!
//! Failed calls are surfaced to the caller as a [`GatewayError`]; the stores
//! decide what happens to local state (rollback). No automatic retry.

mod records;
mod rest;

pub use records::{CartRecord, CollectionRecord, MediaRecord, OneOrMany, ProductRecord, map_product_record};
pub use rest::RestGateway;

use thiserror::Error;

use house_core::{CartItem, Product, ProductId, UserId};

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request. Contains the HTTP status and a
    /// truncated body for diagnostics.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Backend asked us to slow down. Contains the `Retry-After` seconds.
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No authenticated user for a user-scoped operation.
    #[error("Not authenticated")]
    Unauthenticated,
}

/// Which user collection a set-semantics operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Favorites,
    WatchLater,
}

impl CollectionKind {
    /// Backend table name for this collection.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::WatchLater => "watch_later",
        }
    }
}

/// Authenticated CRUD operations against the hosted backend, keyed by
/// `(user, product)`.
///
/// Every method is a suspension point for the calling store; success means
/// the durable copy was updated, failure means it was not (as far as the
/// backend reported).
#[allow(async_fn_in_trait)] // stores run on the client event loop; futures stay local
pub trait RemoteGateway: Send + Sync {
    /// Fetch the user's cart with joined product snapshots.
    async fn fetch_cart(&self, user: &UserId) -> Result<Vec<CartItem>, GatewayError>;

    /// Add `quantity` of a product to the cart, merging with any existing
    /// row for the same `(user, product)` key by summing quantities.
    async fn add_to_cart(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError>;

    /// Overwrite the stored quantity for a cart row.
    async fn update_cart_quantity(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError>;

    /// Delete one cart row. Deleting an absent row is not an error.
    async fn remove_from_cart(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<(), GatewayError>;

    /// Delete every cart row for the user.
    async fn clear_cart(&self, user: &UserId) -> Result<(), GatewayError>;

    /// Fetch a set-semantics collection with joined product snapshots.
    async fn fetch_collection(
        &self,
        user: &UserId,
        kind: CollectionKind,
    ) -> Result<Vec<Product>, GatewayError>;

    /// Insert a product into a collection.
    async fn add_to_collection(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), GatewayError>;

    /// Delete a product from a collection. Absent rows are not an error.
    async fn remove_from_collection(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), GatewayError>;
}

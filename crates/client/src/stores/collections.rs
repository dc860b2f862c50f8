//! Favorites and watch-later stores.
//!
//! Both are set-semantics product collections with the same dual
//! local/remote ownership as the cart, minus quantities and totals. One
//! implementation, parameterized by [`CollectionKind`], backs both; the
//! items live in a key-indexed map so membership checks stay O(1) at any
//! list size.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, instrument, warn};

use house_core::{Product, ProductId, UserId};

use crate::error::Result;
use crate::gateway::{CollectionKind, RemoteGateway};

use super::{read, write};

/// Set-semantics product collection, loosely synchronized with the gateway.
#[derive(Clone)]
pub struct ProductListStore<G> {
    inner: Arc<ListInner<G>>,
}

struct ListInner<G> {
    gateway: Arc<G>,
    user: UserId,
    kind: CollectionKind,
    items: RwLock<HashMap<ProductId, Product>>,
}

/// The user's favorites.
pub type FavoritesStore<G> = ProductListStore<G>;

/// The user's watch-later list.
pub type WatchLaterStore<G> = ProductListStore<G>;

impl<G: RemoteGateway> ProductListStore<G> {
    /// Create an empty favorites store for a user.
    #[must_use]
    pub fn favorites(gateway: Arc<G>, user: UserId) -> Self {
        Self::new(gateway, user, CollectionKind::Favorites)
    }

    /// Create an empty watch-later store for a user.
    #[must_use]
    pub fn watch_later(gateway: Arc<G>, user: UserId) -> Self {
        Self::new(gateway, user, CollectionKind::WatchLater)
    }

    fn new(gateway: Arc<G>, user: UserId, kind: CollectionKind) -> Self {
        Self {
            inner: Arc::new(ListInner {
                gateway,
                user,
                kind,
                items: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Which collection this store mirrors.
    #[must_use]
    pub fn kind(&self) -> CollectionKind {
        self.inner.kind
    }

    /// Replace local state with the gateway's durable copy.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; local state is left untouched on failure.
    #[instrument(skip(self), fields(kind = ?self.inner.kind))]
    pub async fn fetch(&self) -> Result<()> {
        let products = self
            .inner
            .gateway
            .fetch_collection(&self.inner.user, self.inner.kind)
            .await?;
        *write(&self.inner.items) = products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Ok(())
    }

    /// Add a product. Adding a product already present is a no-op and skips
    /// the gateway round trip.
    ///
    /// # Errors
    ///
    /// Gateway failures roll the optimistic insert back.
    #[instrument(skip(self, product), fields(kind = ?self.inner.kind, product = %product.id))]
    pub async fn add(&self, product: Product) -> Result<()> {
        let product_id = product.id.clone();
        {
            let mut items = write(&self.inner.items);
            if items.contains_key(&product_id) {
                debug!("Product already in collection");
                return Ok(());
            }
            items.insert(product_id.clone(), product);
        }

        if let Err(e) = self
            .inner
            .gateway
            .add_to_collection(&self.inner.user, self.inner.kind, &product_id)
            .await
        {
            warn!(error = %e, product = %product_id, "Collection add failed, rolling back");
            write(&self.inner.items).remove(&product_id);
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove a product. Removing an absent product id is a no-op.
    ///
    /// # Errors
    ///
    /// Gateway failures roll the optimistic removal back.
    #[instrument(skip(self), fields(kind = ?self.inner.kind, product = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<()> {
        let Some(removed) = write(&self.inner.items).remove(product_id) else {
            debug!("Product not in collection, nothing to remove");
            return Ok(());
        };

        if let Err(e) = self
            .inner
            .gateway
            .remove_from_collection(&self.inner.user, self.inner.kind, product_id)
            .await
        {
            warn!(error = %e, product = %product_id, "Collection remove failed, rolling back");
            write(&self.inner.items).insert(product_id.clone(), removed);
            return Err(e.into());
        }
        Ok(())
    }

    /// Add the product if absent, remove it if present.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add) / [`remove`](Self::remove).
    pub async fn toggle(&self, product: Product) -> Result<()> {
        if self.contains(&product.id) {
            self.remove(&product.id).await
        } else {
            self.add(product).await
        }
    }

    /// O(1) membership check.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        read(&self.inner.items).contains_key(product_id)
    }

    /// Snapshot of the collection. Iteration order is unspecified; callers
    /// needing display order sort the snapshot themselves.
    #[must_use]
    pub fn items(&self) -> Vec<Product> {
        read(&self.inner.items).values().cloned().collect()
    }

    /// Number of products in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.inner.items).len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.inner.items).is_empty()
    }

    /// Clear local state only. Used for logout and test isolation; the
    /// gateway is not called.
    pub fn reset(&self) {
        write(&self.inner.items).clear();
    }
}

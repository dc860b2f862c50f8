//! Cart store.
//!
//! Maintains the authoritative-for-the-session list of cart items, mirrored
//! durably by the gateway keyed on `(user, product)`. Line uniqueness key is
//! the product id; adding an existing product merges by summing quantities.
//!
//! Totals and counts are recomputed on every call rather than kept as
//! incremental counters, so they cannot drift from the item list.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use house_core::{CartItem, Product, ProductId, UserId};

use crate::error::{ClientError, Result};
use crate::gateway::RemoteGateway;

use super::{read, write};

/// Session cart, loosely synchronized with the remote gateway.
#[derive(Clone)]
pub struct CartStore<G> {
    inner: Arc<CartInner<G>>,
}

struct CartInner<G> {
    gateway: Arc<G>,
    user: UserId,
    items: RwLock<Vec<CartItem>>,
}

impl<G: RemoteGateway> CartStore<G> {
    /// Create an empty cart store for a user.
    #[must_use]
    pub fn new(gateway: Arc<G>, user: UserId) -> Self {
        Self {
            inner: Arc::new(CartInner {
                gateway,
                user,
                items: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Replace local state with the gateway's durable copy.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; local state is left untouched on failure.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<()> {
        let items = self.inner.gateway.fetch_cart(&self.inner.user).await?;
        *write(&self.inner.items) = items;
        Ok(())
    }

    /// Add a product to the cart, merging with an existing line by summing
    /// quantities.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for a zero quantity. Gateway failures roll the
    /// optimistic mutation back and are returned to the caller.
    #[instrument(skip(self, product), fields(product = %product.id, quantity))]
    pub async fn add_to_cart(&self, product: Product, quantity: u32) -> Result<()> {
        if quantity < 1 {
            return Err(ClientError::InvalidQuantity(quantity));
        }

        let product_id = product.id.clone();
        let snapshot = {
            let mut items = write(&self.inner.items);
            let snapshot = items.clone();
            match items.iter_mut().find(|item| item.product.id == product_id) {
                Some(line) => line.quantity = line.quantity.saturating_add(quantity),
                None => items.push(CartItem { product, quantity }),
            }
            snapshot
        };

        if let Err(e) = self
            .inner
            .gateway
            .add_to_cart(&self.inner.user, &product_id, quantity)
            .await
        {
            warn!(error = %e, product = %product_id, "Add to cart failed, rolling back");
            *write(&self.inner.items) = snapshot;
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove a cart line. Removing an absent product id is a no-op and
    /// skips the gateway round trip.
    ///
    /// # Errors
    ///
    /// Gateway failures roll the optimistic removal back.
    #[instrument(skip(self), fields(product = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> Result<()> {
        let snapshot = {
            let mut items = write(&self.inner.items);
            if !items.iter().any(|item| &item.product.id == product_id) {
                debug!("Product not in cart, nothing to remove");
                return Ok(());
            }
            let snapshot = items.clone();
            items.retain(|item| &item.product.id != product_id);
            snapshot
        };

        if let Err(e) = self
            .inner
            .gateway
            .remove_from_cart(&self.inner.user, product_id)
            .await
        {
            warn!(error = %e, product = %product_id, "Remove from cart failed, rolling back");
            *write(&self.inner.items) = snapshot;
            return Err(e.into());
        }
        Ok(())
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// Quantities below 1 are rejected as a no-op (the stored quantity is
    /// unchanged); so is updating a product that is not in the cart.
    ///
    /// # Errors
    ///
    /// Gateway failures roll the optimistic mutation back.
    #[instrument(skip(self), fields(product = %product_id, quantity))]
    pub async fn update_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        if quantity < 1 {
            debug!("Rejecting quantity below 1");
            return Ok(());
        }

        let snapshot = {
            let mut items = write(&self.inner.items);
            let Some(index) = items
                .iter()
                .position(|item| &item.product.id == product_id)
            else {
                debug!("Product not in cart, nothing to update");
                return Ok(());
            };
            let snapshot = items.clone();
            match items.get_mut(index) {
                Some(line) if line.quantity != quantity => line.quantity = quantity,
                _ => return Ok(()),
            }
            snapshot
        };

        if let Err(e) = self
            .inner
            .gateway
            .update_cart_quantity(&self.inner.user, product_id, quantity)
            .await
        {
            warn!(error = %e, product = %product_id, "Quantity update failed, rolling back");
            *write(&self.inner.items) = snapshot;
            return Err(e.into());
        }
        Ok(())
    }

    /// Bump a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Same as [`update_quantity`](Self::update_quantity).
    pub async fn increment_quantity(&self, product_id: &ProductId) -> Result<()> {
        let Some(current) = self.quantity_of(product_id) else {
            return Ok(());
        };
        self.update_quantity(product_id, current.saturating_add(1))
            .await
    }

    /// Lower a line's quantity by one, flooring at 1.
    ///
    /// # Errors
    ///
    /// Same as [`update_quantity`](Self::update_quantity).
    pub async fn decrement_quantity(&self, product_id: &ProductId) -> Result<()> {
        match self.quantity_of(product_id) {
            Some(current) if current > 1 => self.update_quantity(product_id, current - 1).await,
            _ => Ok(()),
        }
    }

    /// Empty the cart both locally and at the gateway.
    ///
    /// # Errors
    ///
    /// Gateway failures restore the previous items.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let snapshot = std::mem::take(&mut *write(&self.inner.items));
        if snapshot.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.inner.gateway.clear_cart(&self.inner.user).await {
            warn!(error = %e, "Cart clear failed, rolling back");
            *write(&self.inner.items) = snapshot;
            return Err(e.into());
        }
        Ok(())
    }

    /// Clear local state only. Used for logout and test isolation; the
    /// gateway is not called.
    pub fn reset(&self) {
        write(&self.inner.items).clear();
    }

    /// Snapshot of the current items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        read(&self.inner.items).clone()
    }

    /// Cart subtotal: sum of `price × quantity` in each line's original
    /// currency. Currency conversion is a presentation concern and is not
    /// applied here.
    #[must_use]
    pub fn get_total(&self) -> Decimal {
        read(&self.inner.items)
            .iter()
            .map(CartItem::line_total)
            .sum()
    }

    /// Total quantity across all lines, for badge counts. Recomputed on
    /// every call.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        read(&self.inner.items)
            .iter()
            .map(|item| item.quantity)
            .sum()
    }

    /// Whether a product has a cart line.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        read(&self.inner.items)
            .iter()
            .any(|item| &item.product.id == product_id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.inner.items).len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.inner.items).is_empty()
    }

    fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        read(&self.inner.items)
            .iter()
            .find(|item| &item.product.id == product_id)
            .map(|item| item.quantity)
    }
}

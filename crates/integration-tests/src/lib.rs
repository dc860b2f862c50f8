//! Test doubles for exercising the client stores end to end.
//!
//! [`MockGateway`] stands in for the hosted backend: it keeps its own
//! durable-side copy of the cart and collections so tests can assert both
//! halves of the optimistic protocol (local state and what the "server"
//! ended up with), and it can be armed to fail the next call to exercise
//! rollback. [`MockRateProvider`] serves a canned rate table and counts
//! fetches so refresh coalescing is observable.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;

use house_client::currency::{RateError, RateProvider};
use house_client::gateway::{CollectionKind, GatewayError, RemoteGateway};
use house_core::{CartItem, Product, ProductId, SellerId, UserId};

/// Build a product snapshot with the given id and price in UZS.
#[must_use]
pub fn product(id: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        description: String::new(),
        price: Decimal::from(price),
        original_price: None,
        currency: "UZS".to_string(),
        images: vec![],
        category: "misc".to_string(),
        in_stock: true,
        rating: None,
        review_count: None,
        seller_id: SellerId::new("seller-1"),
        created_at: None,
    }
}

#[derive(Default)]
struct RemoteState {
    // Durable-side copies, keyed the way the backend keys them
    cart: HashMap<ProductId, (Product, u32)>,
    favorites: HashSet<ProductId>,
    watch_later: HashSet<ProductId>,
}

/// In-memory stand-in for the hosted backend.
#[derive(Default)]
pub struct MockGateway {
    catalog: Mutex<HashMap<ProductId, Product>>,
    state: Mutex<RemoteState>,
    fail_next: AtomicBool,
    calls: AtomicUsize,
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product so cart adds can materialize a snapshot for it.
    pub fn register(&self, product: Product) {
        lock(&self.catalog).insert(product.id.clone(), product);
    }

    /// Arm the gateway to fail the next operation with a server error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// How many gateway operations have been attempted (failed ones count).
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Durable-side quantity for a cart row, if present.
    #[must_use]
    pub fn remote_cart_quantity(&self, product_id: &ProductId) -> Option<u32> {
        lock(&self.state)
            .cart
            .get(product_id)
            .map(|(_, quantity)| *quantity)
    }

    /// Durable-side membership check for a collection.
    #[must_use]
    pub fn remote_contains(&self, kind: CollectionKind, product_id: &ProductId) -> bool {
        let state = lock(&self.state);
        match kind {
            CollectionKind::Favorites => state.favorites.contains(product_id),
            CollectionKind::WatchLater => state.watch_later.contains(product_id),
        }
    }

    /// Seed the durable-side cart directly, bypassing the store.
    pub fn seed_cart(&self, product: Product, quantity: u32) {
        lock(&self.state)
            .cart
            .insert(product.id.clone(), (product, quantity));
    }

    /// Seed a durable-side collection directly, bypassing the store.
    pub fn seed_collection(&self, kind: CollectionKind, product: Product) {
        self.register(product.clone());
        let mut state = lock(&self.state);
        match kind {
            CollectionKind::Favorites => state.favorites.insert(product.id),
            CollectionKind::WatchLater => state.watch_later.insert(product.id),
        };
    }

    fn check_fail(&self) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn snapshot(&self, product_id: &ProductId) -> Result<Product, GatewayError> {
        lock(&self.catalog)
            .get(product_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api {
                status: 404,
                message: format!("unknown product {product_id}"),
            })
    }
}

impl RemoteGateway for MockGateway {
    async fn fetch_cart(&self, _user: &UserId) -> Result<Vec<CartItem>, GatewayError> {
        self.check_fail()?;
        Ok(lock(&self.state)
            .cart
            .values()
            .map(|(product, quantity)| CartItem {
                product: product.clone(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn add_to_cart(
        &self,
        _user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        self.check_fail()?;
        let snapshot = self.snapshot(product)?;
        let mut state = lock(&self.state);
        let entry = state.cart.entry(product.clone()).or_insert((snapshot, 0));
        entry.1 = entry.1.saturating_add(quantity);
        Ok(())
    }

    async fn update_cart_quantity(
        &self,
        _user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        self.check_fail()?;
        if let Some(entry) = lock(&self.state).cart.get_mut(product) {
            entry.1 = quantity;
        }
        Ok(())
    }

    async fn remove_from_cart(
        &self,
        _user: &UserId,
        product: &ProductId,
    ) -> Result<(), GatewayError> {
        self.check_fail()?;
        lock(&self.state).cart.remove(product);
        Ok(())
    }

    async fn clear_cart(&self, _user: &UserId) -> Result<(), GatewayError> {
        self.check_fail()?;
        lock(&self.state).cart.clear();
        Ok(())
    }

    async fn fetch_collection(
        &self,
        _user: &UserId,
        kind: CollectionKind,
    ) -> Result<Vec<Product>, GatewayError> {
        self.check_fail()?;
        let ids: Vec<ProductId> = {
            let state = lock(&self.state);
            match kind {
                CollectionKind::Favorites => state.favorites.iter().cloned().collect(),
                CollectionKind::WatchLater => state.watch_later.iter().cloned().collect(),
            }
        };
        ids.iter().map(|id| self.snapshot(id)).collect()
    }

    async fn add_to_collection(
        &self,
        _user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), GatewayError> {
        self.check_fail()?;
        let mut state = lock(&self.state);
        match kind {
            CollectionKind::Favorites => state.favorites.insert(product.clone()),
            CollectionKind::WatchLater => state.watch_later.insert(product.clone()),
        };
        Ok(())
    }

    async fn remove_from_collection(
        &self,
        _user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), GatewayError> {
        self.check_fail()?;
        let mut state = lock(&self.state);
        match kind {
            CollectionKind::Favorites => state.favorites.remove(product),
            CollectionKind::WatchLater => state.watch_later.remove(product),
        };
        Ok(())
    }
}

/// Rate provider serving a canned table, with an optional artificial delay
/// so concurrent refreshes can overlap deterministically.
///
/// Clones share one fetch counter, so tests can keep a clone while the
/// cache owns the original.
#[derive(Clone)]
pub struct MockRateProvider {
    rates: HashMap<String, Decimal>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockRateProvider {
    #[must_use]
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        Self {
            rates,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches the cache actually performed.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RateProvider for MockRateProvider {
    fn fetch_rates(
        &self,
    ) -> impl std::future::Future<Output = Result<HashMap<String, Decimal>, RateError>> + Send
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rates = self.rates.clone();
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(rates)
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

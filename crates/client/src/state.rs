//! Application state shared across the client.
//!
//! One explicit, context-injected container instead of module-level store
//! singletons: construct it once at application start, pass it down, and
//! call [`ClientState::reset`] on logout (or between tests) for
//! deterministic isolation.

use std::sync::Arc;

use house_core::UserId;

use crate::config::ClientConfig;
use crate::currency::{CbuRateProvider, CurrencyService};
use crate::error::Result;
use crate::gateway::RestGateway;
use crate::stores::{CartStore, FavoritesStore, ProductListStore, SearchHistoryStore, WatchLaterStore};
use crate::sync::{BroadcastChannel, FileStorage, KeyValueStorage, TabChannel};

/// Application state shared across the client.
///
/// Cheaply cloneable via `Arc`; all clones share the same stores.
#[derive(Clone)]
pub struct ClientState {
    inner: Arc<StateInner>,
}

struct StateInner {
    config: ClientConfig,
    cart: CartStore<RestGateway>,
    favorites: FavoritesStore<RestGateway>,
    watch_later: WatchLaterStore<RestGateway>,
    history: SearchHistoryStore,
    currency: CurrencyService<CbuRateProvider>,
}

impl ClientState {
    /// Create the application state with file-backed persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the local storage directory cannot be prepared.
    pub fn new(config: ClientConfig, user: UserId) -> Result<Self> {
        let storage: Arc<dyn KeyValueStorage> =
            Arc::new(FileStorage::new(&config.storage_namespace)?);
        let channel: Arc<dyn TabChannel> = Arc::new(BroadcastChannel::new());
        Ok(Self::with_components(config, user, storage, channel))
    }

    /// Create the application state with injected persistence components.
    ///
    /// Used by tests (in-memory storage) and by hosts that bring their own
    /// storage or tab-notification mechanism.
    #[must_use]
    pub fn with_components(
        config: ClientConfig,
        user: UserId,
        storage: Arc<dyn KeyValueStorage>,
        channel: Arc<dyn TabChannel>,
    ) -> Self {
        let gateway = Arc::new(RestGateway::new(&config));
        let provider = CbuRateProvider::new(config.rates_url.clone());

        let cart = CartStore::new(Arc::clone(&gateway), user.clone());
        let favorites = ProductListStore::favorites(Arc::clone(&gateway), user.clone());
        let watch_later = ProductListStore::watch_later(gateway, user);
        let history = SearchHistoryStore::new(Arc::clone(&storage), channel);
        let currency = CurrencyService::new(provider, config.rates_refresh, storage);

        Self {
            inner: Arc::new(StateInner {
                config,
                cart,
                favorites,
                watch_later,
                history,
                currency,
            }),
        }
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore<RestGateway> {
        &self.inner.cart
    }

    /// Get a reference to the favorites store.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesStore<RestGateway> {
        &self.inner.favorites
    }

    /// Get a reference to the watch-later store.
    #[must_use]
    pub fn watch_later(&self) -> &WatchLaterStore<RestGateway> {
        &self.inner.watch_later
    }

    /// Get a reference to the search history store.
    #[must_use]
    pub fn history(&self) -> &SearchHistoryStore {
        &self.inner.history
    }

    /// Get a reference to the currency service.
    #[must_use]
    pub fn currency(&self) -> &CurrencyService<CbuRateProvider> {
        &self.inner.currency
    }

    /// Clear the user-scoped stores locally (cart, favorites, watch-later).
    ///
    /// Used on logout; search history and the currency preference are
    /// device-scoped and survive. The gateway is not called.
    pub fn reset(&self) {
        self.inner.cart.reset();
        self.inner.favorites.reset();
        self.inner.watch_later.reset();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_RATES_REFRESH, DEFAULT_RATES_URL};
    use crate::sync::MemoryStorage;
    use secrecy::SecretString;

    fn config() -> ClientConfig {
        ClientConfig {
            gateway_url: "https://backend.house.dev".parse().unwrap(),
            gateway_api_key: SecretString::from("k".repeat(32)),
            rates_url: DEFAULT_RATES_URL.to_string(),
            rates_refresh: DEFAULT_RATES_REFRESH,
            storage_namespace: "house-test".to_string(),
        }
    }

    #[test]
    fn test_state_constructs_and_resets() {
        let state = ClientState::with_components(
            config(),
            UserId::new("u-1"),
            Arc::new(MemoryStorage::new()),
            Arc::new(BroadcastChannel::new()),
        );

        assert!(state.cart().is_empty());
        assert!(state.favorites().is_empty());
        state.history().add("ceramic mug");
        state.reset();
        // Device-scoped history survives logout
        assert_eq!(state.history().history(), vec!["ceramic mug"]);
    }
}

//! Currency conversion with a stale-while-revalidate rate cache.
//!
//! Prices are stored in their original currency; conversion into the user's
//! selected display currency happens at presentation time. The rate table
//! is fetched from a [`RateProvider`] and considered fresh for a fixed
//! window (30 minutes by default). Reads never block on the network: when
//! the table is stale a background refresh is spawned and the stale value
//! keeps serving until it lands. Concurrent refreshes coalesce into one
//! provider call.
//!
//! Conversion degrades instead of failing: a missing source or target rate
//! returns the unconverted price so price displays never break.

mod provider;

pub use provider::{CbuRateProvider, RateError, RateProvider};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use house_core::{CurrencyCode, Price};

use crate::sync::KeyValueStorage;

/// The base currency all provider rates are quoted against.
pub const BASE_CURRENCY: &str = "UZS";

/// Storage key for the persisted display-currency preference.
pub const SELECTED_CURRENCY_KEY: &str = "currency.selected";

struct RateTable {
    rates: HashMap<String, Decimal>,
    fetched_at: Instant,
}

/// Rate cache plus the user's display-currency preference.
///
/// Cheaply cloneable; all clones share one table.
pub struct CurrencyService<P> {
    inner: Arc<CurrencyInner<P>>,
}

impl<P> Clone for CurrencyService<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CurrencyInner<P> {
    provider: P,
    refresh_interval: Duration,
    table: RwLock<Option<RateTable>>,
    refreshing: AtomicBool,
    selected: RwLock<CurrencyCode>,
    storage: Arc<dyn KeyValueStorage>,
}

/// Clears the in-flight flag when a refresh finishes, however it exits.
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<P: RateProvider> CurrencyService<P> {
    /// Create a service with an empty rate table, restoring the persisted
    /// display-currency preference if there is one.
    #[must_use]
    pub fn new(
        provider: P,
        refresh_interval: Duration,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let selected = load_selected(storage.as_ref());
        Self {
            inner: Arc::new(CurrencyInner {
                provider,
                refresh_interval,
                table: RwLock::new(None),
                refreshing: AtomicBool::new(false),
                selected: RwLock::new(selected),
                storage,
            }),
        }
    }

    /// The user's current display currency.
    #[must_use]
    pub fn selected_currency(&self) -> CurrencyCode {
        *read(&self.inner.selected)
    }

    /// Change the display currency, persist the preference (best-effort),
    /// and kick off a rate refresh if the table is empty or stale.
    pub fn set_selected_currency(&self, currency: CurrencyCode) {
        *write(&self.inner.selected) = currency;
        if let Err(e) = self
            .inner
            .storage
            .set(SELECTED_CURRENCY_KEY, currency.code())
        {
            warn!(error = %e, "Failed to persist currency preference");
        }
        self.ensure_fresh();
    }

    /// Whether a rate table has been loaded at all.
    #[must_use]
    pub fn rates_loaded(&self) -> bool {
        read(&self.inner.table).is_some()
    }

    /// Whether the loaded table is within the freshness window.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        read(&self.inner.table)
            .as_ref()
            .is_some_and(|t| t.fetched_at.elapsed() < self.inner.refresh_interval)
    }

    /// Trigger a background refresh when the table is empty or stale.
    ///
    /// Never blocks: the read path keeps serving whatever table exists.
    /// Outside an async runtime this is a no-op (rates stay stale until an
    /// explicit [`refresh`](Self::refresh)).
    pub fn ensure_fresh(&self) {
        if self.is_fresh() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let service = self.clone();
                handle.spawn(async move {
                    if let Err(e) = service.refresh().await {
                        warn!(error = %e, "Background rate refresh failed");
                    }
                });
            }
            Err(_) => debug!("No async runtime, skipping background rate refresh"),
        }
    }

    /// Fetch the rate table now.
    ///
    /// Concurrent calls coalesce: while one fetch is in flight, other
    /// callers return immediately without a second provider call. A failed
    /// fetch keeps the previous (stale) table serving.
    ///
    /// # Errors
    ///
    /// Returns the provider error; the cached table is left untouched.
    pub async fn refresh(&self) -> Result<(), RateError> {
        if self.inner.refreshing.swap(true, Ordering::SeqCst) {
            debug!("Rate refresh already in flight");
            return Ok(());
        }
        let _guard = RefreshGuard(&self.inner.refreshing);

        let rates = self.inner.provider.fetch_rates().await?;
        debug!(count = rates.len(), "Rate table refreshed");
        *write(&self.inner.table) = Some(RateTable {
            rates,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Per-unit rate against the base currency, if loaded.
    #[must_use]
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        read(&self.inner.table)
            .as_ref()
            .and_then(|t| t.rates.get(&code.to_uppercase()).copied())
    }

    /// Convert a price from its original currency into the selected display
    /// currency.
    ///
    /// Serves whatever table is loaded, kicking off a background refresh
    /// when it is empty or stale. Falls back to the unconverted price when
    /// either rate is missing or no table is loaded yet.
    #[must_use]
    pub fn convert_price(&self, price: Decimal, from_currency: &str) -> Decimal {
        self.ensure_fresh();
        let selected = self.selected_currency();
        let table = read(&self.inner.table);
        convert(
            table.as_ref().map(|t| &t.rates),
            selected,
            price,
            from_currency,
        )
    }

    /// Convert and format for display in the selected currency.
    #[must_use]
    pub fn format_price(&self, price: Decimal, from_currency: &str) -> String {
        let converted = self.convert_price(price, from_currency);
        Price::new(converted, self.selected_currency()).display()
    }
}

/// Two-step conversion through the base currency. Total: any missing rate
/// returns the input unchanged.
fn convert(
    rates: Option<&HashMap<String, Decimal>>,
    selected: CurrencyCode,
    price: Decimal,
    from: &str,
) -> Decimal {
    if from.eq_ignore_ascii_case(selected.code()) {
        return price;
    }
    let Some(rates) = rates else {
        return price;
    };

    // Step 1: source currency → base
    let in_base = if from.eq_ignore_ascii_case(BASE_CURRENCY) {
        price
    } else {
        match rates.get(&from.to_uppercase()) {
            Some(rate) => price * *rate,
            None => return price,
        }
    };

    // Step 2: base → selected
    if selected.code() == BASE_CURRENCY {
        return in_base;
    }
    match rates.get(selected.code()) {
        Some(rate) if !rate.is_zero() => in_base / *rate,
        _ => price,
    }
}

fn load_selected(storage: &dyn KeyValueStorage) -> CurrencyCode {
    match storage.get(SELECTED_CURRENCY_KEY) {
        Ok(Some(code)) => code.parse().unwrap_or_else(|_| {
            warn!(%code, "Unknown persisted currency, falling back to base");
            CurrencyCode::default()
        }),
        Ok(None) => CurrencyCode::default(),
        Err(e) => {
            warn!(error = %e, "Failed to load currency preference");
            CurrencyCode::default()
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table() -> HashMap<String, Decimal> {
        HashMap::from([
            ("UZS".to_string(), Decimal::ONE),
            ("USD".to_string(), Decimal::from(12_500)),
            ("EUR".to_string(), Decimal::from(14_000)),
        ])
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let rates = table();
        let price = Decimal::from(100);
        assert_eq!(
            convert(Some(&rates), CurrencyCode::USD, price, "usd"),
            price
        );
    }

    #[test]
    fn test_convert_source_to_base() {
        let rates = table();
        // 2 USD → UZS at 12 500
        assert_eq!(
            convert(Some(&rates), CurrencyCode::UZS, Decimal::from(2), "USD"),
            Decimal::from(25_000)
        );
    }

    #[test]
    fn test_convert_through_base() {
        let rates = table();
        // 28 000 UZS → EUR at 14 000
        assert_eq!(
            convert(Some(&rates), CurrencyCode::EUR, Decimal::from(28_000), "UZS"),
            Decimal::from(2)
        );
    }

    #[test]
    fn test_convert_missing_source_rate_falls_back() {
        let rates = table();
        let price = Decimal::from(100);
        assert_eq!(convert(Some(&rates), CurrencyCode::UZS, price, "XYZ"), price);
    }

    #[test]
    fn test_convert_without_table_falls_back() {
        let price = Decimal::from(100);
        assert_eq!(convert(None, CurrencyCode::USD, price, "UZS"), price);
    }
}

//! Search history store.
//!
//! A deduplicated, recency-ordered list of past search terms, persisted
//! locally and mirrored across tabs of the same client. Persistence is
//! best-effort: storage failures are logged and swallowed, never surfaced.
//!
//! Cross-tab flow: every mutation persists the full list and publishes a
//! change event tagged with this store's origin id. Foreign events for the
//! history key cause the in-memory copy to be replaced wholesale from
//! storage (no merge); our own events are ignored.

use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::sync::{KeyValueStorage, TabChannel, TabEvent, TabSubscription};

use super::{lock, read, write};

/// Storage key the history list is persisted under.
pub const HISTORY_KEY: &str = "search.history";

/// Maximum number of remembered terms; the oldest beyond this are dropped.
pub const MAX_HISTORY_ITEMS: usize = 20;

/// Terms shorter than this (in characters, after trimming) are ignored.
const MIN_TERM_CHARS: usize = 2;

/// Recency-ordered search term history.
#[derive(Clone)]
pub struct SearchHistoryStore {
    inner: Arc<HistoryInner>,
}

struct HistoryInner {
    storage: Arc<dyn KeyValueStorage>,
    channel: Arc<dyn TabChannel>,
    subscription: Mutex<TabSubscription>,
    origin: Uuid,
    entries: RwLock<Vec<String>>,
}

impl SearchHistoryStore {
    /// Create a store, loading any persisted history.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, channel: Arc<dyn TabChannel>) -> Self {
        let entries = load_entries(storage.as_ref());
        let subscription = channel.subscribe();
        Self {
            inner: Arc::new(HistoryInner {
                storage,
                channel,
                subscription: Mutex::new(subscription),
                origin: Uuid::new_v4(),
                entries: RwLock::new(entries),
            }),
        }
    }

    /// Record a search term at the front of the history.
    ///
    /// The term is trimmed; anything shorter than two characters is ignored.
    /// A case-insensitive duplicate is removed from its old position and the
    /// new spelling wins. The list is capped at [`MAX_HISTORY_ITEMS`].
    pub fn add(&self, term: &str) {
        self.absorb_foreign_changes();

        let trimmed = term.trim();
        if trimmed.chars().count() < MIN_TERM_CHARS {
            debug!("Ignoring too-short search term");
            return;
        }

        {
            let mut entries = write(&self.inner.entries);
            let lowered = trimmed.to_lowercase();
            entries.retain(|entry| entry.to_lowercase() != lowered);
            entries.insert(0, trimmed.to_string());
            entries.truncate(MAX_HISTORY_ITEMS);
        }
        self.persist();
    }

    /// Remove a term, matching case-insensitively.
    pub fn remove(&self, term: &str) {
        self.absorb_foreign_changes();

        let lowered = term.trim().to_lowercase();
        let changed = {
            let mut entries = write(&self.inner.entries);
            let before = entries.len();
            entries.retain(|entry| entry.to_lowercase() != lowered);
            entries.len() != before
        };
        if changed {
            self.persist();
        }
    }

    /// Drop the entire history, locally and from storage.
    pub fn clear(&self) {
        write(&self.inner.entries).clear();
        if let Err(e) = self.inner.storage.remove(HISTORY_KEY) {
            warn!(error = %e, "Failed to clear persisted search history");
        }
        self.publish();
    }

    /// Current history, most recent first.
    ///
    /// Absorbs any pending foreign-tab changes first, so a change persisted
    /// from another tab is visible without an explicit re-fetch.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.absorb_foreign_changes();
        read(&self.inner.entries).clone()
    }

    /// Number of remembered terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.absorb_foreign_changes();
        read(&self.inner.entries).len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the current list and notify other tabs. Best-effort.
    fn persist(&self) {
        let payload = {
            let entries = read(&self.inner.entries);
            serde_json::to_string(&*entries)
        };
        match payload {
            Ok(json) => {
                if let Err(e) = self.inner.storage.set(HISTORY_KEY, &json) {
                    warn!(error = %e, "Failed to persist search history");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize search history"),
        }
        self.publish();
    }

    fn publish(&self) {
        self.inner.channel.publish(TabEvent {
            key: HISTORY_KEY.to_string(),
            origin: self.inner.origin,
        });
    }

    /// Drain pending tab events; on a foreign change to our key, replace the
    /// in-memory copy wholesale with the persisted value. A lagged
    /// subscription may have dropped a relevant event, so lag forces a
    /// reload too.
    fn absorb_foreign_changes(&self) {
        let mut reload = false;
        {
            let mut subscription = lock(&self.inner.subscription);
            while let Some(event) = subscription.try_next() {
                if event.key == HISTORY_KEY && event.origin != self.inner.origin {
                    reload = true;
                }
            }
            reload |= subscription.take_lagged();
        }
        if reload {
            debug!("Reloading search history after foreign tab change");
            *write(&self.inner.entries) = load_entries(self.inner.storage.as_ref());
        }
    }
}

fn load_entries(storage: &dyn KeyValueStorage) -> Vec<String> {
    match storage.get(HISTORY_KEY) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(error = %e, "Corrupt persisted search history, starting empty");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "Failed to load search history, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{BroadcastChannel, MemoryStorage};

    fn store() -> SearchHistoryStore {
        SearchHistoryStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(BroadcastChannel::new()),
        )
    }

    #[test]
    fn test_short_terms_ignored() {
        let history = store();
        history.add(" a ");
        history.add("");
        assert!(history.is_empty());
        // Two characters is the floor
        history.add("tv");
        assert_eq!(history.history(), vec!["tv"]);
    }

    #[test]
    fn test_dedup_keeps_latest_case_at_front() {
        let history = store();
        history.add("phone");
        history.add("laptop");
        history.add("Phone");
        assert_eq!(history.history(), vec!["Phone", "laptop"]);
    }

    #[test]
    fn test_remove_is_case_insensitive() {
        let history = store();
        history.add("Phone");
        history.remove("phone");
        assert!(history.is_empty());
    }

    #[test]
    fn test_lagged_subscription_reloads_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let channel = Arc::new(BroadcastChannel::new());
        let history = SearchHistoryStore::new(
            Arc::clone(&storage) as Arc<dyn KeyValueStorage>,
            Arc::clone(&channel) as Arc<dyn TabChannel>,
        );

        // Another tab's write lands in storage, but its event is pushed out
        // of the channel by a flood of unrelated traffic before this tab
        // drains its subscription.
        storage.set(HISTORY_KEY, r#"["vase"]"#).unwrap();
        for _ in 0..200 {
            channel.publish(TabEvent {
                key: "currency.selected".to_string(),
                origin: Uuid::new_v4(),
            });
        }

        assert_eq!(history.history(), vec!["vase"]);
    }
}

//! Search history across store instances: persistence, the recency cap,
//! and cross-tab propagation through a shared channel.

use std::sync::Arc;

use house_client::stores::{HISTORY_KEY, MAX_HISTORY_ITEMS, SearchHistoryStore};
use house_client::sync::{BroadcastChannel, KeyValueStorage, MemoryStorage, TabChannel};

fn shared() -> (Arc<dyn KeyValueStorage>, Arc<dyn TabChannel>) {
    (
        Arc::new(MemoryStorage::new()),
        Arc::new(BroadcastChannel::new()),
    )
}

#[test]
fn test_duplicate_moves_to_front_with_new_spelling() {
    let (storage, channel) = shared();
    let history = SearchHistoryStore::new(storage, channel);

    history.add("phone");
    history.add("laptop");
    history.add("Phone");

    assert_eq!(history.history(), vec!["Phone", "laptop"]);
}

#[test]
fn test_cap_evicts_oldest() {
    let (storage, channel) = shared();
    let history = SearchHistoryStore::new(storage, channel);

    for i in 0..=MAX_HISTORY_ITEMS {
        history.add(&format!("term-{i}"));
    }

    assert_eq!(history.len(), MAX_HISTORY_ITEMS);
    let entries = history.history();
    assert_eq!(entries[0], format!("term-{MAX_HISTORY_ITEMS}"));
    // term-0 was the oldest and fell off
    assert!(!entries.contains(&"term-0".to_string()));
}

#[test]
fn test_persisted_payload_is_a_json_array() {
    let (storage, channel) = shared();
    let history = SearchHistoryStore::new(Arc::clone(&storage), channel);

    history.add("phone");
    history.add("laptop");

    let raw = storage.get(HISTORY_KEY).unwrap().expect("history persisted");
    let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, vec!["laptop", "phone"]);
}

#[test]
fn test_history_survives_across_instances() {
    let (storage, channel) = shared();
    {
        let history = SearchHistoryStore::new(Arc::clone(&storage), Arc::clone(&channel));
        history.add("ceramic mug");
        history.add("vase");
    }

    let reopened = SearchHistoryStore::new(storage, channel);
    assert_eq!(reopened.history(), vec!["vase", "ceramic mug"]);
}

#[test]
fn test_foreign_tab_change_is_visible_without_refetch() {
    let (storage, channel) = shared();
    let tab_a = SearchHistoryStore::new(Arc::clone(&storage), Arc::clone(&channel));
    let tab_b = SearchHistoryStore::new(storage, channel);

    tab_a.add("phone");

    // tab_b picks the change up on its next read, no explicit reload
    assert_eq!(tab_b.history(), vec!["phone"]);
}

#[test]
fn test_clear_propagates_to_other_tabs() {
    let (storage, channel) = shared();
    let tab_a = SearchHistoryStore::new(Arc::clone(&storage), Arc::clone(&channel));
    let tab_b = SearchHistoryStore::new(storage, channel);

    tab_a.add("phone");
    assert_eq!(tab_b.len(), 1);

    tab_a.clear();
    assert!(tab_b.is_empty());
}

#[test]
fn test_own_writes_are_not_reloaded_as_foreign() {
    let (storage, channel) = shared();
    let history = SearchHistoryStore::new(storage, channel);

    history.add("phone");
    history.add("laptop");

    // Reads drain our own published events without disturbing order
    assert_eq!(history.history(), vec!["laptop", "phone"]);
    assert_eq!(history.history(), vec!["laptop", "phone"]);
}

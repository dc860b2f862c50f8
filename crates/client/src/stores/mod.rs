//! Client state stores.
//!
//! Each store owns its slice of session state exclusively and keeps it
//! loosely synchronized with the remote gateway. Remote mutations follow one
//! discipline everywhere: apply the change locally first (optimistic), await
//! the gateway, and roll back to the pre-mutation snapshot if the call
//! fails. The error is returned to the caller; nothing is retried.
//!
//! Stores are `Arc`-backed and cheap to clone. Interior locks are never held
//! across an await, so store methods interleave only at gateway calls -
//! callers must not assume atomicity across a round trip.

mod cart;
mod collections;
mod search_history;

pub use cart::CartStore;
pub use collections::{FavoritesStore, ProductListStore, WatchLaterStore};
pub use search_history::{HISTORY_KEY, MAX_HISTORY_ITEMS, SearchHistoryStore};

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Lock poisoning only happens if a panic unwinds mid-mutation; the stores
// hold plain data, so recovering the guard is always safe.

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

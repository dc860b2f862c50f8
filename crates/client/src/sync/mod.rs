//! Local persistence and cross-tab change notification.
//!
//! The browser original leaned on `localStorage` and ambient `storage`
//! events. Here both concerns sit behind explicit traits so the mechanism is
//! swappable on non-browser targets:
//!
//! - [`KeyValueStorage`] - origin-scoped key-value persistence. Writes are
//!   best-effort: quota and serialization failures are something callers log
//!   and swallow, never a user-facing error.
//! - [`TabChannel`] - pub/sub notification that a persisted key changed in
//!   another tab/window of the same client.

mod storage;
mod tabs;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use tabs::{BroadcastChannel, TabChannel, TabEvent, TabSubscription};

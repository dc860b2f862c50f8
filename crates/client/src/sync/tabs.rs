//! Cross-tab change notification.
//!
//! Replaces the browser's ambient `storage` events with an explicit pub/sub
//! seam. Every store instance publishes with its own origin id and ignores
//! its own events on receive, mirroring how `storage` events only fire in
//! *other* tabs.

use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

/// Capacity of the in-process broadcast channel. Consumers that fall this
/// far behind resynchronize from storage anyway.
const CHANNEL_CAPACITY: usize = 64;

/// A persisted key changed somewhere.
#[derive(Debug, Clone)]
pub struct TabEvent {
    /// Storage key that changed.
    pub key: String,
    /// Identity of the publishing store instance.
    pub origin: Uuid,
}

/// Receiving side of a tab channel subscription.
pub struct TabSubscription {
    receiver: broadcast::Receiver<TabEvent>,
    lagged: bool,
}

impl TabSubscription {
    /// Next pending event, without blocking. `None` once drained.
    pub fn try_next(&mut self) -> Option<TabEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    // A dropped event may have been a relevant foreign one;
                    // remember the lag so the consumer can reload wholesale
                    warn!(missed, "Tab subscription lagged");
                    self.lagged = true;
                }
                Err(_) => return None,
            }
        }
    }

    /// Whether events were dropped since the last call. Resets on read.
    pub fn take_lagged(&mut self) -> bool {
        std::mem::take(&mut self.lagged)
    }
}

/// Pub/sub channel for cross-tab notifications.
pub trait TabChannel: Send + Sync {
    /// Announce that a persisted key changed.
    fn publish(&self, event: TabEvent);

    /// Subscribe to future change events.
    fn subscribe(&self) -> TabSubscription;
}

/// In-process channel over `tokio::sync::broadcast`.
///
/// Stands in for browser storage events when all "tabs" live in one
/// process; a different host can provide its own `TabChannel`.
#[derive(Debug)]
pub struct BroadcastChannel {
    sender: broadcast::Sender<TabEvent>,
}

impl BroadcastChannel {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl TabChannel for BroadcastChannel {
    fn publish(&self, event: TabEvent) {
        // Send only fails with zero subscribers, which is fine
        let _ = self.sender.send(event);
    }

    fn subscribe(&self) -> TabSubscription {
        TabSubscription {
            receiver: self.sender.subscribe(),
            lagged: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_subscriber() {
        let channel = BroadcastChannel::new();
        let mut sub = channel.subscribe();
        let origin = Uuid::new_v4();

        channel.publish(TabEvent {
            key: "search.history".to_string(),
            origin,
        });

        let event = sub.try_next().expect("event pending");
        assert_eq!(event.key, "search.history");
        assert_eq!(event.origin, origin);
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_overflow_surfaces_lag() {
        let channel = BroadcastChannel::new();
        let mut sub = channel.subscribe();
        assert!(!sub.take_lagged());

        for _ in 0..(CHANNEL_CAPACITY * 2) {
            channel.publish(TabEvent {
                key: "k".to_string(),
                origin: Uuid::new_v4(),
            });
        }

        while sub.try_next().is_some() {}
        assert!(sub.take_lagged());
        // Cleared once read
        assert!(!sub.take_lagged());
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let channel = BroadcastChannel::new();
        channel.publish(TabEvent {
            key: "k".to_string(),
            origin: Uuid::new_v4(),
        });
    }
}

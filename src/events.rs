//! Typed change notifications.
//!
//! The store publishes a `StoreEvent` after every successful write so that
//! views can re-read the affected collection. Subscribers hold a bounded
//! receiver; a subscriber that falls behind misses events rather than
//! blocking the writer, and closed receivers are pruned on the next publish.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::db::Collection;

/// Per-subscriber channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { collection: Collection, id: String },
    Updated { collection: Collection, id: String },
    Removed { collection: Collection, id: String },
    /// A singleton value was written (profile).
    Replaced { collection: Collection },
    Cleared { collection: Collection },
    /// Periodic follow-up urgency recount.
    UrgencyRefreshed { overdue: usize, due_soon: usize },
}

impl StoreEvent {
    /// The collection a reader should reload, if any.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            Self::Created { collection, .. }
            | Self::Updated { collection, .. }
            | Self::Removed { collection, .. }
            | Self::Replaced { collection }
            | Self::Cleared { collection } => Some(*collection),
            Self::UrgencyRefreshed { .. } => None,
        }
    }
}

/// Fan-out of store events to any number of subscribers.
#[derive(Debug)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::Sender<StoreEvent>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber. Events published before this call are not replayed.
    pub fn subscribe(&self) -> mpsc::Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(_) => tracing::warn!("Event bus lock poisoned, new subscriber will receive nothing"),
        }
        rx
    }

    /// Deliver `event` to every live subscriber without blocking.
    pub fn publish(&self, event: StoreEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            tracing::warn!("Event bus lock poisoned, dropping {event:?}");
            return;
        };
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Subscriber lagging, dropped {event:?}");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Number of live subscribers as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

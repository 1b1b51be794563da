//! # Publishing Side
//!
//! `InMemoryEventBus` is a thin layer over a `tokio::sync::broadcast`
//! channel. Every receiver sees every event; filters are applied by the
//! receiving [`Subscription`], so `publish` reports receivers reached, not
//! receivers interested.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::events::{EventFilter, KojoEvent};
use crate::subscriber::{EventStream, ListenerGuard, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Anything events can be published to.
///
/// Publishing never suspends, so synchronous unit methods can emit too.
pub trait EventPublisher: Send + Sync {
    /// Returns how many live subscriptions the event reached.
    fn publish(&self, event: KojoEvent) -> usize;

    /// Events published so far, delivered or not.
    fn events_published(&self) -> u64;
}

/// Live subscription counts per filter.
pub(crate) type Listeners = Arc<Mutex<HashMap<EventFilter, usize>>>;

/// Broadcast bus owned by one Kojo instance.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<KojoEvent>,
    listeners: Listeners,
    published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering at most `capacity` events for the slowest subscription.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            listeners: Arc::default(),
            published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Start listening. Only events published after this call are seen.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let guard = ListenerGuard::register(Arc::clone(&self.listeners), filter.clone());
        debug!(names = ?filter.names, sources = ?filter.sources, "Subscription opened");
        Subscription::new(self.sender.subscribe(), filter, guard)
    }

    /// Same as [`subscribe`](Self::subscribe), as a `futures::Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Live subscriptions, whatever their filter.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Live subscriptions opened with exactly this filter.
    #[must_use]
    pub fn subscriptions_for(&self, filter: &EventFilter) -> usize {
        self.listeners.lock().get(filter).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.events_published())
            .finish()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: KojoEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);

        let (name, source) = (event.name.clone(), event.source.label().to_string());
        // `send` only fails when nobody is listening.
        let reached = self.sender.send(event).unwrap_or(0);
        debug!(event = %name, source = %source, receivers = reached, "Event published");
        reached
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

//! # Receiving Side
//!
//! A [`Subscription`] wraps one broadcast receiver and drops every event its
//! filter rejects. A subscription that falls more than the bus capacity
//! behind skips the events it missed and carries on.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::debug;

use crate::events::{EventFilter, KojoEvent};
use crate::publisher::Listeners;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every sender is gone: the owning bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// Keeps the per-filter subscription count of the bus accurate.
pub(crate) struct ListenerGuard {
    listeners: Listeners,
    filter: EventFilter,
}

impl ListenerGuard {
    pub(crate) fn register(listeners: Listeners, filter: EventFilter) -> Self {
        *listeners.lock().entry(filter.clone()).or_insert(0) += 1;
        Self { listeners, filter }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut listeners = self.listeners.lock();
        if let Some(count) = listeners.get_mut(&self.filter) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                listeners.remove(&self.filter);
            }
        }
        debug!(names = ?self.filter.names, sources = ?self.filter.sources, "Subscription closed");
    }
}

/// Handle receiving the events that match one filter.
pub struct Subscription {
    receiver: broadcast::Receiver<KojoEvent>,
    filter: EventFilter,
    _guard: ListenerGuard,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<KojoEvent>,
        filter: EventFilter,
        guard: ListenerGuard,
    ) -> Self {
        Self {
            receiver,
            filter,
            _guard: guard,
        }
    }

    /// Wait for the next matching event. `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<KojoEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    debug!(missed, "Subscription lagged behind the bus");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<KojoEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Turn this subscription into a stream.
    #[must_use]
    pub fn into_stream(self) -> EventStream {
        EventStream::new(self)
    }
}

/// A [`Subscription`] as a `futures::Stream`. Ends when the bus is dropped.
pub struct EventStream {
    filter: EventFilter,
    events: BoxStream<'static, KojoEvent>,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let filter = subscription.filter().clone();
        let events = stream::unfold(subscription, |mut subscription| async move {
            let event = subscription.recv().await?;
            Some((event, subscription))
        })
        .boxed();

        Self { filter, events }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = KojoEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}

//! # Kojo Bus - Event Bus for Units and Subscribers
//!
//! Every Kojo instance owns one bus. Unit methods emit through their call
//! context, subscribers listen during startup and keep their subscriptions
//! for the lifetime of the process.
//!
//! ```text
//!   alpha.methodA ──ctx.emit("aCalled")──┐
//!                                        ▼
//!                             InMemoryEventBus (broadcast)
//!                                        │
//!            ┌───────────────────────────┼───────────────────────┐
//!            ▼                           ▼                       ▼
//!   on("aCalled")             from_sources(["alpha"])      EventFilter::all()
//!   (subscriber task)         (host application)           (diagnostics)
//! ```
//!
//! Delivery is broadcast: every live subscription whose filter matches sees
//! every event published after it was created. Events published with no
//! live subscription are dropped.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventSource, KojoEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscription before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

//! # Kojo Events
//!
//! Events are named, carry a JSON payload, and remember who emitted them so
//! listeners can narrow a subscription to a single unit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who published an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    /// The Kojo instance itself, identified by its instance id.
    Instance(String),
    /// A unit method, identified by the unit name.
    Unit(String),
    /// A subscriber, identified by the subscriber name.
    Subscriber(String),
}

impl EventSource {
    /// The name filters match against.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Instance(id) => id,
            Self::Unit(name) | Self::Subscriber(name) => name,
        }
    }
}

/// An event flowing through the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KojoEvent {
    /// Event name, e.g. `aCalled`.
    pub name: String,
    /// Publisher of the event.
    pub source: EventSource,
    /// Arbitrary payload; `Value::Null` when the emitter passed nothing.
    pub payload: Value,
}

impl KojoEvent {
    /// Create an event.
    pub fn new(name: impl Into<String>, source: EventSource, payload: Value) -> Self {
        Self {
            name: name.into(),
            source,
            payload,
        }
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventFilter {
    /// Event names to include. Empty means all names.
    pub names: Vec<String>,
    /// Source labels to include. Empty means all sources.
    pub sources: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific event names.
    #[must_use]
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            sources: Vec::new(),
        }
    }

    /// Create a filter for events from specific sources.
    #[must_use]
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::all().with_sources(sources)
    }

    /// Narrow an existing filter to the given sources.
    #[must_use]
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &KojoEvent) -> bool {
        let name_match = self.names.is_empty() || self.names.iter().any(|n| *n == event.name);

        let source_match = self.sources.is_empty()
            || self.sources.iter().any(|s| s == event.source.label());

        name_match && source_match
    }
}

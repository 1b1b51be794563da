//! # Source Registry - Build-Time Manifest of Units and Subscribers
//!
//! Method and subscriber sources are registered up front; discovery then
//! decides which of them load by scanning the filesystem.
//!
//! ## How It Works
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       SourceRegistry                            │
//! │                                                                 │
//! │  methods                          subscribers                   │
//! │  ┌──────────────────────┐         ┌──────────────────────┐      │
//! │  │ alpha/methodA  Async │         │ subsA                │      │
//! │  │ bravo/methodA  Async │         │ internal.subsA       │      │
//! │  │ charlie/methodA Sync │         └──────────┬───────────┘      │
//! │  └──────────┬───────────┘                    │                  │
//! └─────────────┼────────────────────────────────┼──────────────────┘
//!               ▼                                ▼
//!   services/alpha/methodA.js        subscribers/subsA.js
//!   (file on disk selects source)    (file on disk selects source)
//! ```
//!
//! A file found on disk with no registered source fails discovery. A
//! registered source with no file on disk is never loaded.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use crate::kojo::Kojo;
use crate::loader::MethodContext;
use crate::logger::UnitLogger;

/// Positional call arguments.
pub type Args = Vec<Value>;

/// Body of a synchronous method.
pub type SyncFn = Arc<dyn Fn(&MethodContext, Args) -> anyhow::Result<Value> + Send + Sync>;

/// Body of an asynchronous method.
pub type AsyncFn =
    Arc<dyn Fn(MethodContext, Args) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// What a method source exports.
#[derive(Clone)]
pub enum Export {
    /// A function returning its result directly.
    Sync(SyncFn),
    /// A function returning a pending result.
    Async(AsyncFn),
    /// Not a function at all.
    Value(Value),
    /// A function in a calling convention the wrapper does not know,
    /// e.g. callback style.
    Unsupported { kind: String },
}

impl Export {
    /// Register a synchronous body.
    pub fn sync<F>(body: F) -> Self
    where
        F: Fn(&MethodContext, Args) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(body))
    }

    /// Register an asynchronous body.
    pub fn asynchronous<F, Fut>(body: F) -> Self
    where
        F: Fn(MethodContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::Async(Arc::new(move |ctx, args| body(ctx, args).boxed()))
    }

    pub fn value(value: Value) -> Self {
        Self::Value(value)
    }

    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::Unsupported { kind: kind.into() }
    }

    /// Short description used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> String {
        match self {
            Self::Sync(_) => "sync function".to_string(),
            Self::Async(_) => "async function".to_string(),
            Self::Value(value) => json_type(value).to_string(),
            Self::Unsupported { kind } => kind.clone(),
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Export::Sync"),
            Self::Async(_) => f.write_str("Export::Async"),
            Self::Value(value) => f.debug_tuple("Export::Value").field(value).finish(),
            Self::Unsupported { kind } => f
                .debug_struct("Export::Unsupported")
                .field("kind", kind)
                .finish(),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// SUBSCRIBERS
// =============================================================================

/// A one-shot startup hook, run once the unit namespace is complete.
///
/// Typical subscribers wire event listeners between units and return; a
/// subscriber that needs to wait on another one may do so through the bus.
///
/// The body runs inside `Kojo::ready`. Calling `ready()` on the same
/// instance from the body fails with `KojoError::ReentrantReady`. A task
/// spawned by the body may await `ready()`, as long as the body does not
/// wait for that task.
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn subscribe(&self, kojo: Kojo, logger: UnitLogger) -> anyhow::Result<()>;
}

/// Adapter turning an async closure into a [`Subscriber`].
pub struct FnSubscriber<F> {
    body: F,
}

#[async_trait]
impl<F, Fut> Subscriber for FnSubscriber<F>
where
    F: Fn(Kojo, UnitLogger) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn subscribe(&self, kojo: Kojo, logger: UnitLogger) -> anyhow::Result<()> {
        (self.body)(kojo, logger).await
    }
}

/// Wrap a closure `|kojo, logger| async move { ... }` as a subscriber.
pub fn subscriber_fn<F, Fut>(body: F) -> FnSubscriber<F>
where
    F: Fn(Kojo, UnitLogger) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnSubscriber { body }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Every method and subscriber source the application can load.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    methods: HashMap<String, HashMap<String, Export>>,
    subscribers: HashMap<String, Arc<dyn Subscriber>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the source of `unit/method`, replacing any earlier one.
    pub fn register_method(
        &mut self,
        unit: impl Into<String>,
        method: impl Into<String>,
        export: Export,
    ) {
        let (unit, method) = (unit.into(), method.into());
        let kind = export.kind_name();
        debug!(unit = %unit, method = %method, kind = %kind, "Registered method source");
        self.methods.entry(unit).or_default().insert(method, export);
    }

    #[must_use]
    pub fn with_method(
        mut self,
        unit: impl Into<String>,
        method: impl Into<String>,
        export: Export,
    ) -> Self {
        self.register_method(unit, method, export);
        self
    }

    /// Register the subscriber loaded from `<subscribers dir>/<name>.<ext>`.
    pub fn register_subscriber(
        &mut self,
        name: impl Into<String>,
        subscriber: impl Subscriber + 'static,
    ) {
        let name = name.into();
        debug!(subscriber = %name, "Registered subscriber source");
        self.subscribers.insert(name, Arc::new(subscriber));
    }

    #[must_use]
    pub fn with_subscriber(
        mut self,
        name: impl Into<String>,
        subscriber: impl Subscriber + 'static,
    ) -> Self {
        self.register_subscriber(name, subscriber);
        self
    }

    #[must_use]
    pub fn method(&self, unit: &str, method: &str) -> Option<&Export> {
        self.methods.get(unit)?.get(method)
    }

    #[must_use]
    pub fn subscriber(&self, name: &str) -> Option<Arc<dyn Subscriber>> {
        self.subscribers.get(name).cloned()
    }

    /// Registered method names per unit, sorted.
    #[must_use]
    pub fn units(&self) -> BTreeMap<&str, Vec<&str>> {
        self.methods
            .iter()
            .map(|(unit, methods)| {
                let mut names: Vec<&str> = methods.keys().map(String::as_str).collect();
                names.sort_unstable();
                (unit.as_str(), names)
            })
            .collect()
    }

    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subscribers: Vec<&str> = self.subscribers.keys().map(String::as_str).collect();
        subscribers.sort_unstable();
        f.debug_struct("SourceRegistry")
            .field("units", &self.units())
            .field("subscribers", &subscribers)
            .finish()
    }
}

//! # Kojo - Root Composer
//!
//! Owns everything one application instance is made of: configuration,
//! identity, state store, event bus and the unit namespace. `ready()` runs
//! discovery once:
//!
//! ```text
//! Constructed ──ready()──→ LoadingUnits ──→ LoadingSubscribers ──→ Ready
//!                               │                   │
//!                               └───────┬───────────┘
//!                                       ↓
//!                                    Failed
//! ```
//!
//! `Kojo` is a cheap handle; clones share the same instance. Wrapped methods
//! keep only a weak reference back, and receive a strong handle per call.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Arc, Weak};

use kojo_bus::{
    EventFilter, EventPublisher, EventSource, InMemoryEventBus, KojoEvent, Subscription,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::container::{InstanceIdentity, KojoConfig, KojoOptions, StateStore, StateValue};
use crate::error::KojoError;
use crate::loader::{SubscriberLoader, Unit, UnitLoader};
use crate::logger::{LoggerFactory, UnitLogger};
use crate::registry::{Args, SourceRegistry};

tokio::task_local! {
    /// Instance whose discovery pass is being driven by the current task.
    static BOOTSTRAPPING: usize;
}

/// What one successful discovery pass found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadyReport {
    pub units: usize,
    pub subscribers: usize,
}

/// Bootstrap state of a Kojo instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapPhase {
    Constructed,
    LoadingUnits,
    LoadingSubscribers,
    Ready(ReadyReport),
    /// Terminal. Holds the message of the error that aborted discovery.
    Failed(String),
}

pub(crate) struct KojoInner {
    config: KojoConfig,
    identity: InstanceIdentity,
    loggers: LoggerFactory,
    logger: UnitLogger,
    registry: SourceRegistry,
    state: StateStore,
    bus: InMemoryEventBus,
    namespace: RwLock<HashMap<String, Arc<Unit>>>,
    subscribers: RwLock<Vec<String>>,
    phase: RwLock<BootstrapPhase>,
    /// Serialises `ready()` callers.
    bootstrap: Mutex<()>,
}

/// Handle to one Kojo instance.
#[derive(Clone)]
pub struct Kojo {
    inner: Arc<KojoInner>,
}

impl Kojo {
    /// Create an instance from caller options and the application's sources.
    ///
    /// Nothing is read from disk until [`Kojo::ready`].
    pub fn new(options: KojoOptions, registry: SourceRegistry) -> Self {
        Self::with_config(KojoConfig::resolve(options), registry)
    }

    pub fn with_config(config: KojoConfig, registry: SourceRegistry) -> Self {
        let identity = InstanceIdentity::new(config.name.clone(), config.icon.clone());
        let loggers = LoggerFactory::new(&identity, &config);
        let logger = loggers.logger([config.namespace.as_str()]);

        Self {
            inner: Arc::new(KojoInner {
                config,
                identity,
                loggers,
                logger,
                registry,
                state: StateStore::new(),
                bus: InMemoryEventBus::new(),
                namespace: RwLock::new(HashMap::new()),
                subscribers: RwLock::new(Vec::new()),
                phase: RwLock::new(BootstrapPhase::Constructed),
                bootstrap: Mutex::new(()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<KojoInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<KojoInner> {
        Arc::downgrade(&self.inner)
    }

    // =========================================================================
    // IDENTITY & CONFIGURATION
    // =========================================================================

    /// Unique instance id, e.g. `user-service.zM8n6`.
    #[must_use]
    pub fn id(&self) -> &str {
        self.inner.identity.id()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.identity.name()
    }

    #[must_use]
    pub fn icon(&self) -> &str {
        self.inner.identity.icon()
    }

    #[must_use]
    pub fn identity(&self) -> &InstanceIdentity {
        &self.inner.identity
    }

    #[must_use]
    pub fn config(&self) -> &KojoConfig {
        &self.inner.config
    }

    /// Instance-level logger, tagged with the namespace name.
    #[must_use]
    pub fn logger(&self) -> &UnitLogger {
        &self.inner.logger
    }

    // =========================================================================
    // STATE STORE
    // =========================================================================

    /// Store a shared object: a database handle, a transport client, a flag.
    /// Available in every phase.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.inner.state.set(key, value);
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.inner.state.get(key)
    }

    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<StateValue> {
        self.inner.state.get_raw(key)
    }

    /// Every stored entry.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, StateValue> {
        self.inner.state.snapshot()
    }

    #[must_use]
    pub fn state(&self) -> &StateStore {
        &self.inner.state
    }

    // =========================================================================
    // BOOTSTRAP
    // =========================================================================

    #[must_use]
    pub fn phase(&self) -> BootstrapPhase {
        self.inner.phase.read().clone()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(*self.inner.phase.read(), BootstrapPhase::Ready(_))
    }

    /// Discover units, then run subscribers.
    ///
    /// Runs at most once per instance. Later calls, including concurrent
    /// ones, wait for the first pass and return its outcome: the same report
    /// after success, `BootstrapFailed` after a failure.
    ///
    /// Calling it from inside the pass (from a subscriber body) fails with
    /// `ReentrantReady` instead of waiting on itself.
    pub async fn ready(&self) -> Result<ReadyReport, KojoError> {
        let key = self.key();
        if BOOTSTRAPPING.try_with(|running| *running == key).unwrap_or(false) {
            return Err(KojoError::ReentrantReady(self.id().to_string()));
        }

        let _pass = self.inner.bootstrap.lock().await;

        let settled = match &*self.inner.phase.read() {
            BootstrapPhase::Ready(report) => Some(Ok(*report)),
            BootstrapPhase::Failed(reason) => {
                Some(Err(KojoError::BootstrapFailed(reason.clone())))
            }
            _ => None,
        };
        if let Some(outcome) = settled {
            return outcome;
        }

        self.announce();

        match BOOTSTRAPPING.scope(key, self.discover()).await {
            Ok(report) => {
                self.set_phase(BootstrapPhase::Ready(report));
                let line = format!("{} kojo \"{}\" ready", self.icon(), self.name());
                self.logger().info(line);
                Ok(report)
            }
            Err(error) => {
                self.set_phase(BootstrapPhase::Failed(error.to_string()));
                self.logger().error(format!("bootstrap failed: {error}"));
                Err(error)
            }
        }
    }

    async fn discover(&self) -> Result<ReadyReport, KojoError> {
        let inner = &self.inner;
        let icon = self.icon();

        self.set_phase(BootstrapPhase::LoadingUnits);
        let units_path = inner.config.units_path();
        let mut units = Vec::new();
        if self.discovery_path_present(&units_path, inner.config.units_dir_explicit).await? {
            self.logger().info(format!("{icon} loading {}...", inner.config.namespace));
            let loader = UnitLoader::new(
                &inner.registry,
                &inner.loggers,
                inner.config.unsupported_exports,
                self.downgrade(),
            );
            units = loader.load_all(&units_path).await?;
        } else {
            self.logger().info(format!("{icon} skipping {}", inner.config.namespace));
        }

        // Commit only once every unit loaded.
        let unit_count = units.len();
        {
            let mut namespace = inner.namespace.write();
            for unit in units {
                namespace.insert(unit.name().to_string(), Arc::new(unit));
            }
        }
        self.logger().info(format!("{icon} {} done ({unit_count})", inner.config.namespace));

        self.set_phase(BootstrapPhase::LoadingSubscribers);
        let subscribers_path = inner.config.subscribers_path();
        let mut subscribers = Vec::new();
        if self
            .discovery_path_present(&subscribers_path, inner.config.subscribers_dir_explicit)
            .await?
        {
            self.logger().info(format!("{icon} loading subscribers..."));
            subscribers = SubscriberLoader::new(&inner.registry, &inner.loggers)
                .run_all(&subscribers_path, self)
                .await?;
        } else {
            self.logger().info(format!("{icon} skipping subscribers"));
        }

        let subscriber_count = subscribers.len();
        *inner.subscribers.write() = subscribers;
        self.logger().info(format!("{icon} subscribers done ({subscriber_count})"));

        Ok(ReadyReport {
            units: unit_count,
            subscribers: subscriber_count,
        })
    }

    /// Whether `path` exists. A missing path is only an error when the
    /// caller configured it explicitly.
    async fn discovery_path_present(
        &self,
        path: &Path,
        explicit: bool,
    ) -> Result<bool, KojoError> {
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(source) if source.kind() == io::ErrorKind::NotFound && !explicit => Ok(false),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                Err(KojoError::DiscoveryPathMissing {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(source) => Err(KojoError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Identifies this instance among all live ones.
    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn set_phase(&self, phase: BootstrapPhase) {
        *self.inner.phase.write() = phase;
    }

    fn announce(&self) {
        let parent = self
            .inner
            .config
            .parent_package
            .as_ref()
            .map(|package| format!("{}@{}  |  ", package.name, package.version))
            .unwrap_or_default();

        self.logger().info(format!(
            "{} {}  |  {}{}@{}",
            self.icon(),
            self.id(),
            parent,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        ));
    }

    // =========================================================================
    // NAMESPACE
    // =========================================================================

    /// Name the unit namespace is exposed under, `services` by default.
    #[must_use]
    pub fn namespace_name(&self) -> &str {
        &self.inner.config.namespace
    }

    pub fn unit(&self, name: &str) -> Result<Arc<Unit>, KojoError> {
        self.inner
            .namespace
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| KojoError::UnitNotFound(name.to_string()))
    }

    /// Every loaded unit. Empty before `ready()` completes.
    #[must_use]
    pub fn units(&self) -> HashMap<String, Arc<Unit>> {
        self.inner.namespace.read().clone()
    }

    /// Loaded unit names, sorted.
    #[must_use]
    pub fn unit_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.namespace.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Call `unit.method`. Failures keep the method's original message.
    pub async fn call(&self, unit: &str, method: &str, args: Args) -> anyhow::Result<Value> {
        let unit = self.unit(unit)?;
        unit.call(method, args).await
    }

    /// Names of the subscribers invoked during bootstrap, in listing order.
    #[must_use]
    pub fn subscribers(&self) -> Vec<String> {
        self.inner.subscribers.read().clone()
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Publish an event sourced from the instance itself.
    pub fn emit(&self, name: impl Into<String>, payload: Value) -> usize {
        let event = KojoEvent::new(name, EventSource::Instance(self.id().to_string()), payload);
        self.inner.bus.publish(event)
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.inner.bus.subscribe(filter)
    }

    /// Listen for events with the given name, from any source.
    #[must_use]
    pub fn on(&self, name: impl Into<String>) -> Subscription {
        self.subscribe(EventFilter::named([name.into()]))
    }

    #[must_use]
    pub fn bus(&self) -> &InMemoryEventBus {
        &self.inner.bus
    }
}

impl fmt::Debug for Kojo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kojo")
            .field("id", &self.id())
            .field("phase", &self.phase())
            .field("units", &self.unit_names())
            .finish()
    }
}

//! # Function Classifier & Wrapper
//!
//! Turns a registered [`Export`] into a [`Method`] with one calling
//! convention:
//!
//! 1. A fresh [`MethodContext`] is built, carrying the owning `Kojo` handle
//!    and a logger tagged `unit.method`.
//! 2. The body runs with that context and the caller's arguments.
//! 3. A failure is logged once at error level through the bound logger and
//!    returned to the caller as a [`MethodFailure`] displaying the original
//!    message.
//!
//! A body that propagates a `MethodFailure` from another unit's method hands
//! it back unchanged: the inner wrapper already logged it.

use std::fmt;
use std::sync::{Arc, Weak};

use kojo_bus::{EventPublisher, EventSource, KojoEvent};
use serde_json::Value;
use tracing::warn;

use crate::container::ExportPolicy;
use crate::error::{KojoError, MethodFailure};
use crate::kojo::{Kojo, KojoInner};
use crate::loader::Unit;
use crate::logger::UnitLogger;
use crate::registry::{Args, AsyncFn, Export, SyncFn};

/// Calling convention of a wrapped method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Sync,
    Async,
}

/// A classified method body.
#[derive(Clone)]
pub enum MethodBody {
    Sync(SyncFn),
    Async(AsyncFn),
}

impl MethodBody {
    #[must_use]
    pub fn kind(&self) -> MethodKind {
        match self {
            Self::Sync(_) => MethodKind::Sync,
            Self::Async(_) => MethodKind::Async,
        }
    }
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodBody::{:?}", self.kind())
    }
}

/// Decide whether `export` can become a method of `unit`.
///
/// Returns `Ok(None)` when the export is skipped under [`ExportPolicy::Skip`].
pub fn classify(
    unit: &str,
    method: &str,
    export: Export,
    policy: ExportPolicy,
) -> Result<Option<MethodBody>, KojoError> {
    match export {
        Export::Sync(body) => Ok(Some(MethodBody::Sync(body))),
        Export::Async(body) => Ok(Some(MethodBody::Async(body))),
        Export::Value(value) => Err(KojoError::InvalidExport {
            unit: unit.to_string(),
            method: method.to_string(),
            found: Export::Value(value).kind_name(),
        }),
        Export::Unsupported { kind } => match policy {
            ExportPolicy::Fail => Err(KojoError::UnsupportedExportKind {
                unit: unit.to_string(),
                method: method.to_string(),
                kind,
            }),
            ExportPolicy::Skip => {
                warn!(unit, method, kind = %kind, "Skipping export with unsupported function kind");
                Ok(None)
            }
        },
    }
}

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// What a method body gets besides its arguments.
#[derive(Clone)]
pub struct MethodContext {
    kojo: Kojo,
    logger: UnitLogger,
    unit: Arc<str>,
}

impl MethodContext {
    pub(crate) fn new(kojo: Kojo, logger: UnitLogger, unit: Arc<str>) -> Self {
        Self { kojo, logger, unit }
    }

    #[must_use]
    pub fn kojo(&self) -> &Kojo {
        &self.kojo
    }

    /// Logger tagged `unit.method`.
    #[must_use]
    pub fn logger(&self) -> &UnitLogger {
        &self.logger
    }

    /// Another unit of the same instance.
    pub fn unit(&self, name: &str) -> Result<Arc<Unit>, KojoError> {
        self.kojo.unit(name)
    }

    /// Call `unit.method` on the same instance.
    pub async fn call(&self, unit: &str, method: &str, args: Args) -> anyhow::Result<Value> {
        self.kojo.call(unit, method, args).await
    }

    /// Publish an event sourced from this method's unit.
    pub fn emit(&self, name: impl Into<String>, payload: Value) -> usize {
        let event = KojoEvent::new(name, EventSource::Unit(self.unit.to_string()), payload);
        self.kojo.bus().publish(event)
    }
}

impl fmt::Debug for MethodContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodContext")
            .field("instance", &self.kojo.id())
            .field("tag", &self.logger.tag())
            .finish()
    }
}

// =============================================================================
// WRAPPED METHOD
// =============================================================================

/// A loaded, wrapped unit method.
pub struct Method {
    unit: Arc<str>,
    name: Arc<str>,
    body: MethodBody,
    logger: UnitLogger,
    kojo: Weak<KojoInner>,
}

impl Method {
    pub(crate) fn new(
        unit: Arc<str>,
        name: impl Into<Arc<str>>,
        body: MethodBody,
        logger: UnitLogger,
        kojo: Weak<KojoInner>,
    ) -> Self {
        Self {
            unit,
            name: name.into(),
            body,
            logger,
            kojo,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[must_use]
    pub fn kind(&self) -> MethodKind {
        self.body.kind()
    }

    /// Invoke the method, whatever its kind.
    pub async fn call(&self, args: Args) -> Result<Value, MethodFailure> {
        let ctx = self.context()?;

        let result = match &self.body {
            MethodBody::Sync(body) => body(&ctx, args),
            MethodBody::Async(body) => body(ctx, args).await,
        };

        result.map_err(|error| self.fail(error))
    }

    /// Invoke a synchronous method without suspending.
    pub fn call_sync(&self, args: Args) -> Result<Value, MethodFailure> {
        let MethodBody::Sync(body) = &self.body else {
            return Err(self.fail(
                KojoError::NotSynchronous {
                    unit: self.unit.to_string(),
                    method: self.name.to_string(),
                }
                .into(),
            ));
        };

        let ctx = self.context()?;
        body(&ctx, args).map_err(|error| self.fail(error))
    }

    fn context(&self) -> Result<MethodContext, MethodFailure> {
        let inner = self.kojo.upgrade().ok_or_else(|| {
            self.fail(
                KojoError::Detached {
                    unit: self.unit.to_string(),
                    method: self.name.to_string(),
                }
                .into(),
            )
        })?;

        Ok(MethodContext::new(
            Kojo::from_inner(inner),
            self.logger.clone(),
            Arc::clone(&self.unit),
        ))
    }

    fn fail(&self, error: anyhow::Error) -> MethodFailure {
        match error.downcast::<MethodFailure>() {
            Ok(failure) => failure,
            Err(error) => {
                self.logger.error(&error);
                MethodFailure::new(&*self.unit, &*self.name, error)
            }
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("unit", &self.unit)
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

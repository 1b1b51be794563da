//! # Kojo Runtime
//!
//! Convention-over-configuration bootstrap for small backend services.
//! A [`Kojo`] instance discovers *units* and *subscribers* on disk, wraps
//! every unit method with one calling convention, and exposes them together
//! with a shared state store and an event bus.
//!
//! ## Layout on Disk
//!
//! ```text
//! <root>/
//! ├── services/            units, one directory each
//! │   ├── alpha/
//! │   │   ├── methodA.js   method `alpha.methodA`
//! │   │   └── test.js      reserved, never loaded
//! │   └── bravo/
//! │       └── methodA.js
//! └── subscribers/         startup hooks, one file each
//!     ├── internal.subsA.js
//!     └── subsC.js
//! ```
//!
//! Files only select which sources load. The code behind each file is
//! registered up front in a [`SourceRegistry`]:
//!
//! ```no_run
//! use kojo_runtime::{Export, Kojo, KojoOptions, SourceRegistry};
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = SourceRegistry::new()
//!     .with_method("bravo", "methodA", Export::asynchronous(|_, _| async { Ok(json!("bravo")) }))
//!     .with_method("alpha", "methodA", Export::asynchronous(|ctx, args| async move {
//!         ctx.call("bravo", "methodA", args).await
//!     }));
//!
//! let kojo = Kojo::new(KojoOptions::default().with_name("users"), registry);
//! kojo.ready().await?;
//! assert_eq!(kojo.call("alpha", "methodA", vec![]).await?, json!("bravo"));
//! # Ok(())
//! # }
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::type_complexity)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod container;
pub mod error;
pub mod kojo;
pub mod loader;
pub mod logger;
pub mod registry;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use container::{
    ExportPolicy, InstanceIdentity, KojoConfig, KojoOptions, PackageInfo, StateStore,
};
pub use error::{KojoError, MethodFailure};
pub use kojo::{BootstrapPhase, Kojo, ReadyReport};
pub use loader::{Method, MethodContext, MethodKind, Unit};
pub use logger::{LogLevel, LoggerFactory, UnitLogger, LOG_LEVEL_ENV};
pub use registry::{subscriber_fn, Args, Export, SourceRegistry, Subscriber};
pub use telemetry::init_tracing;

// Bus types used in public signatures
pub use kojo_bus::{EventFilter, EventSource, KojoEvent, Subscription};

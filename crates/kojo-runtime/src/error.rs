//! Error types for discovery and method calls.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the engine itself.
///
/// Discovery errors abort `Kojo::ready`; lookup errors surface to whoever
/// asked for a unit or method that does not exist.
#[derive(Debug, Error)]
pub enum KojoError {
    #[error("Method {unit}.{method} does not export a function (found {found})")]
    InvalidExport {
        unit: String,
        method: String,
        found: String,
    },

    #[error("Method {unit}.{method} exports an unsupported function kind: {kind}")]
    UnsupportedExportKind {
        unit: String,
        method: String,
        kind: String,
    },

    #[error("Discovery path {} does not exist", path.display())]
    DiscoveryPathMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No source registered for {}", path.display())]
    SourceNotRegistered { path: PathBuf },

    #[error("{name} is defined twice, again by {}", path.display())]
    DuplicateSource { name: String, path: PathBuf },

    #[error("Subscriber {subscriber} failed to initialize: {error}")]
    SubscriberInitFailure {
        subscriber: String,
        error: anyhow::Error,
    },

    #[error("Unit {0} is not loaded")]
    UnitNotFound(String),

    #[error("Method {unit}.{method} is not defined")]
    MethodNotFound { unit: String, method: String },

    #[error("Method {unit}.{method} is asynchronous and cannot be called synchronously")]
    NotSynchronous { unit: String, method: String },

    #[error("Kojo instance dropped before {unit}.{method} was called")]
    Detached { unit: String, method: String },

    #[error("ready() called from inside the bootstrap of {0}")]
    ReentrantReady(String),

    #[error("Bootstrap already failed: {0}")]
    BootstrapFailed(String),
}

impl KojoError {
    /// The error raised by a subscriber body, when this is a subscriber failure.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::SubscriberInitFailure { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A wrapped method failed during a call.
///
/// Displays exactly as the error the method body returned. The failure has
/// already been logged by the wrapper of `unit.method`, so wrappers further
/// up the call chain pass it through untouched.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct MethodFailure {
    unit: String,
    method: String,
    error: anyhow::Error,
}

impl MethodFailure {
    pub(crate) fn new(
        unit: impl Into<String>,
        method: impl Into<String>,
        error: anyhow::Error,
    ) -> Self {
        Self {
            unit: unit.into(),
            method: method.into(),
            error,
        }
    }

    /// Unit whose method failed first.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Method that failed first.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The error returned by the method body.
    #[must_use]
    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// Take the original error.
    #[must_use]
    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

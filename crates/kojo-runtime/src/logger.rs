//! # Tagged Loggers
//!
//! Every unit method and every subscriber gets its own `UnitLogger`, bound to
//! the instance identity and a tag (`unit.method` or the subscriber name).
//! Lines are emitted as `tracing` events with `instance`, `icon` and `tag`
//! fields, so any subscriber installed by the host (see
//! [`crate::telemetry::init_tracing`]) renders them.
//!
//! The level threshold is applied here, before `tracing` sees the event:
//! it comes from the instance configuration, overridden by the `LOG_LEVEL`
//! environment variable when that holds a recognised level.

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::container::{InstanceIdentity, KojoConfig};

/// Environment variable overriding the configured log level.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Logger threshold. `Silent` suppresses everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Silent,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "silent" | "off" => Ok(Self::Silent),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Silent => "silent",
        };
        f.write_str(name)
    }
}

/// Level actually used: a parseable environment override wins.
#[must_use]
pub fn effective_level(env_override: Option<&str>, configured: LogLevel) -> LogLevel {
    env_override
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(configured)
}

/// Produces loggers sharing one instance identity and threshold.
#[derive(Debug, Clone)]
pub struct LoggerFactory {
    instance: Arc<str>,
    icon: Arc<str>,
    level: LogLevel,
}

impl LoggerFactory {
    /// Build a factory for an instance. Reads `LOG_LEVEL` once.
    pub fn new(identity: &InstanceIdentity, config: &KojoConfig) -> Self {
        let env_level = std::env::var(LOG_LEVEL_ENV).ok();
        Self::with_level(
            identity.logger_identity(config.logger_identity_suffix_enabled),
            identity.icon(),
            effective_level(env_level.as_deref(), config.log_level),
        )
    }

    pub fn with_level(instance: &str, icon: &str, level: LogLevel) -> Self {
        Self {
            instance: Arc::from(instance),
            icon: Arc::from(icon),
            level,
        }
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Logger tagged `unit.method`.
    #[must_use]
    pub fn method_logger(&self, unit: &str, method: &str) -> UnitLogger {
        self.logger([unit, method])
    }

    /// Logger tagged with the subscriber name.
    #[must_use]
    pub fn subscriber_logger(&self, subscriber: &str) -> UnitLogger {
        self.logger([subscriber])
    }

    /// Logger with arbitrary tag pieces, joined with `.`.
    #[must_use]
    pub fn logger<'a>(&self, pieces: impl IntoIterator<Item = &'a str>) -> UnitLogger {
        let tag = pieces.into_iter().collect::<Vec<_>>().join(".");
        UnitLogger {
            instance: Arc::clone(&self.instance),
            icon: Arc::clone(&self.icon),
            tag: Arc::from(tag),
            custom_tags: Vec::new(),
            level: self.level,
        }
    }
}

/// A logger bound to one unit method or subscriber.
#[derive(Debug, Clone)]
pub struct UnitLogger {
    instance: Arc<str>,
    icon: Arc<str>,
    tag: Arc<str>,
    custom_tags: Vec<String>,
    level: LogLevel,
}

impl UnitLogger {
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// A copy of this logger carrying an extra tag, e.g. a request id.
    #[must_use]
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        let mut logger = self.clone();
        logger.custom_tags.push(tag.into());
        logger
    }

    #[must_use]
    pub fn custom_tags(&self) -> &[String] {
        &self.custom_tags
    }

    /// Whether a line at `level` would be emitted.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && self.level != LogLevel::Silent && level >= self.level
    }

    pub fn trace(&self, message: impl Display) {
        self.emit(LogLevel::Trace, &message);
    }

    pub fn debug(&self, message: impl Display) {
        self.emit(LogLevel::Debug, &message);
    }

    pub fn info(&self, message: impl Display) {
        self.emit(LogLevel::Info, &message);
    }

    pub fn warn(&self, message: impl Display) {
        self.emit(LogLevel::Warn, &message);
    }

    pub fn error(&self, message: impl Display) {
        self.emit(LogLevel::Error, &message);
    }

    fn emit(&self, level: LogLevel, message: &dyn Display) {
        if !self.enabled(level) {
            return;
        }

        let instance = &*self.instance;
        let icon = &*self.icon;
        let tag = &*self.tag;
        let request = self.custom_tags.join(",");

        match level {
            LogLevel::Trace => trace!(instance, icon, tag, request = %request, "{}", message),
            LogLevel::Debug => debug!(instance, icon, tag, request = %request, "{}", message),
            LogLevel::Info => info!(instance, icon, tag, request = %request, "{}", message),
            LogLevel::Warn => warn!(instance, icon, tag, request = %request, "{}", message),
            LogLevel::Error => error!(instance, icon, tag, request = %request, "{}", message),
            LogLevel::Silent => {}
        }
    }
}

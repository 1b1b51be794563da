//! Console tracing setup for applications hosting a Kojo instance.
//!
//! Unit loggers only produce `tracing` events. Hosts that do not install a
//! subscriber of their own can call [`init_tracing`] once at startup.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::logger::{LogLevel, LOG_LEVEL_ENV};

/// `EnvFilter` directive for a level.
#[must_use]
pub fn filter_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
        LogLevel::Silent => "off",
    }
}

/// Install a global fmt subscriber.
///
/// The filter comes from `LOG_LEVEL` when it holds a valid directive,
/// otherwise from `default_level`. Fails if a global subscriber is already
/// installed.
pub fn init_tracing(default_level: LogLevel) -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .or_else(|_| EnvFilter::try_new(filter_directive(default_level)))
        .map_err(|e| anyhow!("invalid log filter: {e}"))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("tracing already initialized: {e}"))?;

    tracing::debug!(default = %default_level, "Tracing initialized");
    Ok(())
}

//! # Kojo Configuration
//!
//! Caller options overlaid on defaults. Options arrive either as a struct
//! literal or as an opaque key-value document (already parsed into JSON by
//! whatever configuration layer the host application uses).
//!
//! ## Recognised Keys
//!
//! | Key | Aliases | Default |
//! |---|---|---|
//! | `rootDir` | | current directory |
//! | `unitsDirectoryPath` | `modulesDir`, `servicesDir` | `services` |
//! | `subscribersDirectoryPath` | `subsDir` | `subscribers` |
//! | `namespace` | | `services` |
//! | `displayName` | `name` | `工場` |
//! | `displayIcon` | `icon` | `☢` |
//! | `logLevel` | | `debug` |
//! | `loggerIdentitySuffixEnabled` | `loggerIdSuffix` | `false` |
//! | `unsupportedExports` | | `fail` |
//! | `parentPackage` | | none |
//!
//! Unknown keys are kept verbatim and never validated.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::logger::LogLevel;

/// Default units directory, relative to the root directory.
pub const DEFAULT_UNITS_DIR: &str = "services";

/// Default subscribers directory, relative to the root directory.
pub const DEFAULT_SUBSCRIBERS_DIR: &str = "subscribers";

/// Default name of the unit namespace.
pub const DEFAULT_NAMESPACE: &str = "services";

/// Default instance display name.
pub const DEFAULT_NAME: &str = "工場";

/// Default instance display icon.
pub const DEFAULT_ICON: &str = "☢";

/// What to do with a method source whose function kind is not recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPolicy {
    /// Abort discovery.
    #[default]
    Fail,
    /// Leave the method out of its unit and log a warning.
    Skip,
}

/// Name and version of the application hosting the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

/// Caller-supplied options. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KojoOptions {
    pub root_dir: Option<PathBuf>,
    #[serde(alias = "modulesDir", alias = "servicesDir")]
    pub units_directory_path: Option<PathBuf>,
    #[serde(alias = "subsDir")]
    pub subscribers_directory_path: Option<PathBuf>,
    pub namespace: Option<String>,
    #[serde(alias = "name")]
    pub display_name: Option<String>,
    #[serde(alias = "icon")]
    pub display_icon: Option<String>,
    pub log_level: Option<String>,
    #[serde(alias = "loggerIdSuffix")]
    pub logger_identity_suffix_enabled: Option<bool>,
    pub unsupported_exports: Option<ExportPolicy>,
    pub parent_package: Option<PackageInfo>,
    /// Keys the engine does not recognise.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KojoOptions {
    /// Parse options from an already-decoded configuration document.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn with_root_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root.into());
        self
    }

    pub fn with_units_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.units_directory_path = Some(dir.into());
        self
    }

    pub fn with_subscribers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.subscribers_directory_path = Some(dir.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.display_icon = Some(icon.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_unsupported_exports(mut self, policy: ExportPolicy) -> Self {
        self.unsupported_exports = Some(policy);
        self
    }
}

/// Resolved configuration of one Kojo instance.
#[derive(Debug, Clone)]
pub struct KojoConfig {
    pub root_dir: PathBuf,
    pub units_dir: PathBuf,
    pub subscribers_dir: PathBuf,
    /// Whether the caller chose `units_dir` (a missing directory is then fatal).
    pub units_dir_explicit: bool,
    /// Whether the caller chose `subscribers_dir`.
    pub subscribers_dir_explicit: bool,
    pub namespace: String,
    pub name: String,
    pub icon: String,
    pub log_level: LogLevel,
    pub logger_identity_suffix_enabled: bool,
    pub unsupported_exports: ExportPolicy,
    pub parent_package: Option<PackageInfo>,
    pub extra: Map<String, Value>,
}

impl Default for KojoConfig {
    fn default() -> Self {
        Self::resolve(KojoOptions::default())
    }
}

impl KojoConfig {
    /// Overlay caller options on the defaults. Caller values win.
    pub fn resolve(options: KojoOptions) -> Self {
        let log_level = match options.log_level.as_deref() {
            None => LogLevel::Debug,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(level = raw, "Unknown log level, falling back to debug");
                LogLevel::Debug
            }),
        };

        Self {
            root_dir: options.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            units_dir_explicit: options.units_directory_path.is_some(),
            units_dir: options
                .units_directory_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UNITS_DIR)),
            subscribers_dir_explicit: options.subscribers_directory_path.is_some(),
            subscribers_dir: options
                .subscribers_directory_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SUBSCRIBERS_DIR)),
            namespace: options.namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            name: options.display_name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            icon: options.display_icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            log_level,
            logger_identity_suffix_enabled: options.logger_identity_suffix_enabled.unwrap_or(false),
            unsupported_exports: options.unsupported_exports.unwrap_or_default(),
            parent_package: options.parent_package,
            extra: options.extra,
        }
    }

    /// Absolute-or-root-relative path of the units directory.
    #[must_use]
    pub fn units_path(&self) -> PathBuf {
        self.resolve_path(&self.units_dir)
    }

    /// Absolute-or-root-relative path of the subscribers directory.
    #[must_use]
    pub fn subscribers_path(&self) -> PathBuf {
        self.resolve_path(&self.subscribers_dir)
    }

    /// A pass-through option the engine does not interpret.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    fn resolve_path(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root_dir.join(dir)
        }
    }
}

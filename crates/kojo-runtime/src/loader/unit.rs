//! # Unit Loader
//!
//! One directory under the units path becomes one [`Unit`]. Every file in it
//! is a method source, except files whose stem is `test` and nested
//! directories. Two files with the same stem (`methodA.js`, `methodA.ts`)
//! are rejected. A unit either loads completely or not at all.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::debug;

use crate::container::ExportPolicy;
use crate::error::KojoError;
use crate::kojo::KojoInner;
use crate::loader::wrapper::{classify, Method};
use crate::loader::read_dir_entries;
use crate::logger::LoggerFactory;
use crate::registry::{Args, SourceRegistry};

/// File stem reserved for test fixtures next to method sources.
pub const RESERVED_STEM: &str = "test";

/// A loaded unit: a named set of wrapped methods. Immutable once built.
#[derive(Debug)]
pub struct Unit {
    name: Arc<str>,
    methods: BTreeMap<String, Method>,
}

impl Unit {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Call one of this unit's methods.
    pub async fn call(&self, method: &str, args: Args) -> anyhow::Result<Value> {
        let method = self.method(method).ok_or_else(|| KojoError::MethodNotFound {
            unit: self.name.to_string(),
            method: method.to_string(),
        })?;

        Ok(method.call(args).await?)
    }
}

/// Builds units for one Kojo instance.
pub struct UnitLoader<'a> {
    registry: &'a SourceRegistry,
    loggers: &'a LoggerFactory,
    policy: ExportPolicy,
    kojo: Weak<KojoInner>,
}

impl<'a> UnitLoader<'a> {
    pub(crate) fn new(
        registry: &'a SourceRegistry,
        loggers: &'a LoggerFactory,
        policy: ExportPolicy,
        kojo: Weak<KojoInner>,
    ) -> Self {
        Self {
            registry,
            loggers,
            policy,
            kojo,
        }
    }

    /// Load every unit under `units_dir`, in listing order.
    ///
    /// Plain files directly under `units_dir` are ignored; each subdirectory
    /// is one unit. The caller handles a missing `units_dir`.
    pub async fn load_all(&self, units_dir: &Path) -> Result<Vec<Unit>, KojoError> {
        let entries = read_dir_entries(units_dir).await.map_err(|source| KojoError::Io {
            path: units_dir.to_path_buf(),
            source,
        })?;

        let mut units = Vec::new();
        for entry in entries {
            if !entry.is_dir {
                debug!(path = %entry.path.display(), "Ignoring file outside any unit");
                continue;
            }
            units.push(self.load(&entry.name, &entry.path).await?);
        }

        Ok(units)
    }

    /// Load the unit `name` from `dir`.
    pub async fn load(&self, name: &str, dir: &Path) -> Result<Unit, KojoError> {
        let entries = read_dir_entries(dir).await.map_err(|source| KojoError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let unit_name: Arc<str> = Arc::from(name);
        let mut methods = BTreeMap::new();
        let mut seen = BTreeSet::new();

        for entry in entries {
            if entry.stem == RESERVED_STEM {
                debug!(unit = name, path = %entry.path.display(), "Skipping reserved test file");
                continue;
            }
            if entry.is_dir {
                debug!(unit = name, path = %entry.path.display(), "Skipping nested directory");
                continue;
            }

            if !seen.insert(entry.stem.clone()) {
                return Err(KojoError::DuplicateSource {
                    name: format!("{name}.{}", entry.stem),
                    path: entry.path,
                });
            }

            let export = self
                .registry
                .method(name, &entry.stem)
                .cloned()
                .ok_or_else(|| KojoError::SourceNotRegistered {
                    path: entry.path.clone(),
                })?;

            let Some(body) = classify(name, &entry.stem, export, self.policy)? else {
                continue;
            };

            let logger = self.loggers.method_logger(name, &entry.stem);
            let method = Method::new(
                Arc::clone(&unit_name),
                entry.stem.as_str(),
                body,
                logger,
                self.kojo.clone(),
            );
            methods.insert(entry.stem, method);
        }

        debug!(unit = name, count = methods.len(), "Unit loaded");

        Ok(Unit {
            name: unit_name,
            methods,
        })
    }
}

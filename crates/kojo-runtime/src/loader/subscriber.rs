//! # Subscriber Loader
//!
//! Runs every subscriber found directly under the subscribers path. All
//! bodies are started in listing order before any of them is awaited, then
//! driven together until every one has settled. Subdirectories are skipped,
//! and two files with the same stem are rejected before anything runs.

use std::path::Path;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::KojoError;
use crate::kojo::Kojo;
use crate::loader::read_dir_entries;
use crate::logger::LoggerFactory;
use crate::registry::SourceRegistry;

/// Runs the subscribers of one Kojo instance.
pub struct SubscriberLoader<'a> {
    registry: &'a SourceRegistry,
    loggers: &'a LoggerFactory,
}

impl<'a> SubscriberLoader<'a> {
    pub(crate) fn new(registry: &'a SourceRegistry, loggers: &'a LoggerFactory) -> Self {
        Self { registry, loggers }
    }

    /// Invoke every subscriber under `dir` with `kojo`.
    ///
    /// Returns the invoked subscriber names in listing order. When one or
    /// more bodies fail, the first failure in listing order is returned once
    /// all of them have settled.
    pub async fn run_all(&self, dir: &Path, kojo: &Kojo) -> Result<Vec<String>, KojoError> {
        let entries = read_dir_entries(dir).await.map_err(|source| KojoError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut names = Vec::new();
        let mut sources = Vec::new();
        for entry in entries {
            if entry.is_dir {
                debug!(path = %entry.path.display(), "Skipping directory under subscribers path");
                continue;
            }

            if names.contains(&entry.stem) {
                return Err(KojoError::DuplicateSource {
                    name: entry.stem,
                    path: entry.path,
                });
            }

            let subscriber = self
                .registry
                .subscriber(&entry.stem)
                .ok_or_else(|| KojoError::SourceNotRegistered {
                    path: entry.path.clone(),
                })?;

            names.push(entry.stem);
            sources.push(subscriber);
        }

        let pending = names.iter().zip(&sources).map(|(name, subscriber)| {
            let logger = self.loggers.subscriber_logger(name);
            subscriber.subscribe(kojo.clone(), logger)
        });
        let results = join_all(pending).await;

        let mut first_failure = None;
        for (name, result) in names.iter().zip(results) {
            if let Err(cause) = result {
                warn!(subscriber = %name, error = %cause, "Subscriber failed to initialize");
                first_failure.get_or_insert(KojoError::SubscriberInitFailure {
                    subscriber: name.clone(),
                    error: cause,
                });
            }
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(names),
        }
    }
}

//! # Discovery Loaders
//!
//! - `wrapper` - classifies an export and wraps it with the calling convention
//! - `unit` - builds one unit from one directory
//! - `subscriber` - runs every subscriber found in the subscribers directory
//!
//! Both loaders list directories non-recursively, in the order the
//! filesystem returns entries.

pub mod subscriber;
pub mod unit;
pub mod wrapper;

pub use subscriber::SubscriberLoader;
pub use unit::{Unit, UnitLoader};
pub use wrapper::{classify, Method, MethodBody, MethodContext, MethodKind};

use std::io;
use std::path::{Path, PathBuf};

/// One directory entry, as discovery sees it.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub path: PathBuf,
    /// Full file name. Unit directories are named by it.
    pub name: String,
    /// File name without its last extension. Method and subscriber files
    /// are named by it.
    pub stem: String,
    /// Directory itself, not a symlink to one.
    pub is_dir: bool,
}

/// List `dir` in filesystem order. Symlinks are not followed when deciding
/// whether an entry is a directory.
pub(crate) async fn read_dir_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let path = entry.path();
        let is_dir = entry.file_type().await?.is_dir();
        let name = entry.file_name().to_string_lossy().into_owned();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        entries.push(Entry {
            path,
            name,
            stem,
            is_dir,
        });
    }

    Ok(entries)
}

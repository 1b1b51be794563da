//! # Instance Container
//!
//! Everything a Kojo instance owns outright, independent of discovery:
//!
//! - `config` - options overlaid on defaults
//! - `identity` - name, unique id and icon
//! - `state` - the shared key/value store

pub mod config;
pub mod identity;
pub mod state;

pub use config::{ExportPolicy, KojoConfig, KojoOptions, PackageInfo};
pub use identity::InstanceIdentity;
pub use state::{StateStore, StateValue};

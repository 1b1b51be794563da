//! # Kojo Test Suite
//!
//! End-to-end scenarios run against real directory trees.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Directory trees and source registries
//!     ├── units.rs          # Cross-unit calls, state access, failures
//!     └── subscribers.rs    # Concurrent subscriber startup
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p kojo-tests
//! cargo test -p kojo-tests integration::subscribers::
//! ```

pub mod integration;

//! Shared directory trees and sources for the end-to-end scenarios.

use std::fs;
use std::path::Path;

use kojo_runtime::{Export, KojoOptions, SourceRegistry};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Method files of the reference application.
pub const METHOD_FILES: &[&str] = &[
    "services/alpha/methodA.js",
    "services/alpha/methodB.js",
    "services/alpha/methodC.js",
    "services/alpha/test.js",
    "services/bravo/methodA.js",
    "services/bravo/methodB.js",
    "services/charlie/methodA.js",
];

/// Create `files` (empty) under a fresh temporary root.
pub fn tree(files: &[&str]) -> TempDir {
    let root = tempfile::tempdir().expect("temp dir");
    for file in files {
        let path = root.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, "").expect("write marker");
    }
    root
}

pub fn options(root: &Path) -> KojoOptions {
    KojoOptions::default()
        .with_root_dir(root)
        .with_name("test")
        .with_icon("🚩")
}

/// Sources behind [`METHOD_FILES`].
///
/// - `alpha.methodA` emits `aCalled` and returns `bravo.methodA()`
/// - `alpha.methodB` returns the `nats` state entry
/// - `alpha.methodC` returns `bravo.methodB()`, which always fails
/// - `charlie.methodA` multiplies its argument by the `variable` state entry
pub fn registry() -> SourceRegistry {
    SourceRegistry::new()
        .with_method(
            "alpha",
            "methodA",
            Export::asynchronous(|ctx, _| async move {
                ctx.logger().debug("called");
                ctx.emit("aCalled", json!("boo"));
                ctx.call("bravo", "methodA", vec![]).await
            }),
        )
        .with_method(
            "alpha",
            "methodB",
            Export::asynchronous(|ctx, _| async move {
                let nats = ctx
                    .kojo()
                    .get::<Value>("nats")
                    .ok_or_else(|| anyhow::anyhow!("nats is not set"))?;
                anyhow::Ok((*nats).clone())
            }),
        )
        .with_method(
            "alpha",
            "methodC",
            Export::asynchronous(|ctx, args| async move {
                ctx.call("bravo", "methodB", args).await
            }),
        )
        .with_method("bravo", "methodA", Export::asynchronous(|_, _| async { Ok(json!("bravo")) }))
        .with_method(
            "bravo",
            "methodB",
            Export::asynchronous(|_, _| async { Err(anyhow::anyhow!("bravo exploded")) }),
        )
        .with_method(
            "charlie",
            "methodA",
            Export::sync(|ctx, args| {
                let variable = ctx.kojo().get::<i64>("variable").map_or(0, |v| *v);
                let arg = args
                    .first()
                    .and_then(Value::as_i64)
                    .ok_or_else(|| anyhow::anyhow!("No arguments defined"))?;
                Ok(json!(arg * variable))
            }),
        )
}

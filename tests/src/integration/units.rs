//! # Unit Scenarios
//!
//! Units discovered from disk calling each other through the instance
//! namespace, reading shared state, and failing.
//!
//! ## Flows Tested:
//!
//! 1. **alpha → bravo**: an async method awaits another unit's async method
//! 2. **charlie ← state**: a sync method reads a value set by the host
//! 3. **alpha → bravo (failing)**: the caller sees the inner message

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kojo_bus::EventFilter;
    use kojo_runtime::{BootstrapPhase, Kojo, KojoError, MethodFailure, MethodKind, ReadyReport};
    use serde_json::{json, Value};
    use tokio::time::timeout;

    use crate::integration::fixtures::{options, registry, tree, METHOD_FILES};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    async fn ready_kojo() -> (tempfile::TempDir, Kojo) {
        let root = tree(METHOD_FILES);
        let kojo = Kojo::new(options(root.path()), registry());
        kojo.ready().await.expect("bootstrap");
        (root, kojo)
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_units_reach_each_other() {
        let (_root, kojo) = ready_kojo().await;

        let result = kojo.call("alpha", "methodA", vec![]).await.unwrap();

        assert_eq!(result, json!("bravo"));
    }

    #[tokio::test]
    async fn test_discovered_shape() {
        let (_root, kojo) = ready_kojo().await;

        assert_eq!(kojo.phase(), BootstrapPhase::Ready(ReadyReport { units: 3, subscribers: 0 }));
        assert_eq!(kojo.unit_names(), vec!["alpha", "bravo", "charlie"]);

        let alpha = kojo.unit("alpha").unwrap();
        assert_eq!(alpha.method_names(), vec!["methodA", "methodB", "methodC"]);
        assert_eq!(alpha.method("methodA").map(|m| m.kind()), Some(MethodKind::Async));
        assert_eq!(
            kojo.unit("charlie").unwrap().method("methodA").map(|m| m.kind()),
            Some(MethodKind::Sync)
        );
    }

    #[tokio::test]
    async fn test_method_reads_state() {
        let (_root, kojo) = ready_kojo().await;
        kojo.set("variable", 12_i64);

        let result = kojo.call("charlie", "methodA", vec![json!(3)]).await.unwrap();

        assert_eq!(result, json!(36));
    }

    #[tokio::test]
    async fn test_method_without_argument_fails() {
        let (_root, kojo) = ready_kojo().await;
        kojo.set("variable", 12_i64);

        let error = kojo.call("charlie", "methodA", vec![]).await.unwrap_err();
        assert_eq!(error.to_string(), "No arguments defined");

        let charlie = kojo.unit("charlie").unwrap();
        let sync_error = charlie.method("methodA").unwrap().call_sync(vec![]).unwrap_err();
        assert_eq!(sync_error.to_string(), "No arguments defined");
    }

    #[tokio::test]
    async fn test_nested_failure_keeps_inner_message() {
        let (_root, kojo) = ready_kojo().await;

        let error = kojo.call("alpha", "methodC", vec![]).await.unwrap_err();

        assert_eq!(error.to_string(), "bravo exploded");
        let failure = error.downcast_ref::<MethodFailure>().expect("method failure");
        assert_eq!((failure.unit(), failure.method()), ("bravo", "methodB"));
    }

    #[tokio::test]
    async fn test_state_set_after_ready_is_visible() {
        let (_root, kojo) = ready_kojo().await;
        kojo.set("nats", json!({ "host": "natsHost", "connection": true }));
        kojo.set("rub", "튎嵸覆".to_string());

        let nats = kojo.call("alpha", "methodB", vec![]).await.unwrap();
        assert_eq!(nats["host"], "natsHost");
        assert_eq!(nats["connection"], true);

        let snapshot = kojo.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(kojo.get::<String>("rub").as_deref().map(String::as_str), Some("튎嵸覆"));
    }

    #[tokio::test]
    async fn test_unit_events_observed_by_host() {
        let (_root, kojo) = ready_kojo().await;
        let mut called = kojo.subscribe(EventFilter::named(["aCalled"]).with_sources(["alpha"]));

        kojo.call("alpha", "methodA", vec![]).await.unwrap();

        let event = timeout(Duration::from_millis(100), called.recv())
            .await
            .expect("Should receive within timeout")
            .expect("Should have event");
        assert_eq!(event.payload, Value::from("boo"));
    }

    #[tokio::test]
    async fn test_lookup_errors() {
        let (_root, kojo) = ready_kojo().await;

        assert!(matches!(kojo.unit("delta"), Err(KojoError::UnitNotFound(_))));

        let error = kojo.call("alpha", "methodZ", vec![]).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KojoError>(),
            Some(KojoError::MethodNotFound { .. })
        ));
    }
}

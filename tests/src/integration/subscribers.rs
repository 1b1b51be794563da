//! # Subscriber Scenarios
//!
//! Startup hooks run once the unit namespace is complete. All of them are
//! started before any is awaited, so one subscriber may wait on another.
//!
//! ## Flows Tested:
//!
//! 1. **subsA waits on subsC**: readiness resolves only after both finish
//! 2. **subsC fails**: readiness fails, after subsA has still settled
//! 3. **listener wiring**: a subscriber relays unit events after startup

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use kojo_runtime::{subscriber_fn, Kojo, KojoError, ReadyReport, SourceRegistry};
    use serde_json::{json, Value};
    use tokio::sync::Notify;
    use tokio::time::timeout;

    use crate::integration::fixtures::{options, registry, tree, METHOD_FILES};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const BOUND: Duration = Duration::from_secs(1);

    /// Completion counters shared with the subscribers.
    #[derive(Default)]
    struct Progress {
        subs_a: AtomicUsize,
        subs_c: AtomicUsize,
    }

    fn files_with(subscribers: &[&'static str]) -> Vec<&'static str> {
        let mut files = METHOD_FILES.to_vec();
        files.extend_from_slice(subscribers);
        files
    }

    /// `internal.subsA` checks the namespace, then waits for `subsC`.
    /// `subsC` signals `internal.subsA`, then succeeds or fails.
    fn pair(progress: &Arc<Progress>, gate: &Arc<Notify>, subs_c_fails: bool) -> SourceRegistry {
        let (a_progress, a_gate) = (Arc::clone(progress), Arc::clone(gate));
        let (c_progress, c_gate) = (Arc::clone(progress), Arc::clone(gate));

        registry()
            .with_subscriber(
                "internal.subsA",
                subscriber_fn(move |kojo, logger| {
                    let (progress, gate) = (Arc::clone(&a_progress), Arc::clone(&a_gate));
                    async move {
                        kojo.unit("alpha")?;
                        kojo.unit("bravo")?;
                        logger.debug("waiting for subsC");
                        gate.notified().await;
                        progress.subs_a.fetch_add(1, Ordering::SeqCst);
                        anyhow::Ok(())
                    }
                }),
            )
            .with_subscriber(
                "subsC",
                subscriber_fn(move |kojo, _| {
                    let (progress, gate) = (Arc::clone(&c_progress), Arc::clone(&c_gate));
                    async move {
                        kojo.unit("alpha")?;
                        tokio::task::yield_now().await;
                        gate.notify_one();
                        progress.subs_c.fetch_add(1, Ordering::SeqCst);
                        if subs_c_fails {
                            anyhow::bail!("subsC could not connect");
                        }
                        anyhow::Ok(())
                    }
                }),
            )
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_ready_waits_for_every_subscriber() {
        // Arrange
        let root = tree(&files_with(&["subscribers/internal.subsA.js", "subscribers/subsC.js"]));
        let (progress, gate) = (Arc::new(Progress::default()), Arc::new(Notify::new()));
        let kojo = Kojo::new(options(root.path()), pair(&progress, &gate, false));

        // Act
        let report = timeout(BOUND, kojo.ready())
            .await
            .expect("Should be ready within timeout")
            .expect("Should bootstrap");

        // Assert
        assert_eq!(report, ReadyReport { units: 3, subscribers: 2 });
        assert_eq!(progress.subs_a.load(Ordering::SeqCst), 1);
        assert_eq!(progress.subs_c.load(Ordering::SeqCst), 1);

        let mut names = kojo.subscribers();
        names.sort();
        assert_eq!(names, vec!["internal.subsA", "subsC"]);
    }

    #[tokio::test]
    async fn test_failing_subscriber_aborts_ready() {
        // Arrange
        let root = tree(&files_with(&["subscribers/internal.subsA.js", "subscribers/subsC.js"]));
        let (progress, gate) = (Arc::new(Progress::default()), Arc::new(Notify::new()));
        let kojo = Kojo::new(options(root.path()), pair(&progress, &gate, true));

        // Act
        let error = timeout(BOUND, kojo.ready())
            .await
            .expect("Should settle within timeout")
            .expect_err("Should fail");

        // Assert
        assert!(matches!(
            error,
            KojoError::SubscriberInitFailure { ref subscriber, .. } if subscriber == "subsC"
        ));
        assert_eq!(
            error.cause().map(ToString::to_string).as_deref(),
            Some("subsC could not connect")
        );
        assert_eq!(progress.subs_a.load(Ordering::SeqCst), 1);
        assert!(!kojo.is_ready());
    }

    #[tokio::test]
    async fn test_subscriber_wires_listener() {
        // Arrange: the subscriber relays alpha's `aCalled` into the state store
        let root = tree(&files_with(&["subscribers/internal.subsA.js"]));
        let relayed = Arc::new(Notify::new());
        let signal = Arc::clone(&relayed);
        let registry = registry().with_subscriber(
            "internal.subsA",
            subscriber_fn(move |kojo, logger| {
                let signal = Arc::clone(&signal);
                async move {
                    let mut called = kojo.on("aCalled");
                    tokio::spawn(async move {
                        if let Some(event) = called.recv().await {
                            let line = format!("got alpha.aCalled with {}", event.payload);
                            logger.with_tag("req-1").info(line);
                            kojo.set("relayed", event.payload);
                            signal.notify_one();
                        }
                    });
                    anyhow::Ok(())
                }
            }),
        );
        let kojo = Kojo::new(options(root.path()), registry);
        kojo.ready().await.unwrap();

        // Act
        kojo.call("alpha", "methodA", vec![]).await.unwrap();
        timeout(BOUND, relayed.notified())
            .await
            .expect("Should relay within timeout");

        // Assert
        assert_eq!(kojo.get::<Value>("relayed").as_deref(), Some(&json!("boo")));
    }
}

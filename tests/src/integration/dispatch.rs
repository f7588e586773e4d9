//! # Dispatch Semantics Scenarios
//!
//! Listener-facing guarantees: registration-order dispatch with wildcard
//! listeners last, cooperative propagation stop, per-listener fault
//! isolation, `once` auto-unregistration, filter veto scoped to one kind,
//! and the listener cap refusing (not failing) registration.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use event_bridge::{
        BridgeConfig, EventBridge, EventKind, EventPayload, EventSource, EventSubmission,
        ListenerError, ListenerKey,
    };
    use parking_lot::Mutex;

    fn unbatched_bridge() -> EventBridge {
        let mut config = BridgeConfig::default();
        config.batching_enabled = false;
        config.dedup_enabled = false;
        EventBridge::with_config(config)
    }

    fn key_down() -> EventSubmission {
        EventSubmission::normal(
            EventKind::KeyDown,
            EventPayload::key("a", "KeyA"),
            EventSource::Interaction,
        )
    }

    fn key_up() -> EventSubmission {
        EventSubmission::normal(
            EventKind::KeyUp,
            EventPayload::key("a", "KeyA"),
            EventSource::Interaction,
        )
    }

    /// Appends a label to the shared log when invoked.
    fn labelled(
        log: &Arc<Mutex<Vec<&'static str>>>,
        label: &'static str,
    ) -> impl Fn(Arc<event_bridge::BridgeEvent>) + Send + Sync + 'static {
        let log = log.clone();
        move |_event| log.lock().push(label)
    }

    #[tokio::test]
    async fn test_kind_listeners_before_wildcard_in_registration_order() {
        let bridge = unbatched_bridge();
        let log = Arc::new(Mutex::new(Vec::new()));

        bridge.on_any({
            let log = log.clone();
            move |_event| {
                let log = log.clone();
                async move {
                    log.lock().push("wildcard");
                    Ok(())
                }
            }
        });
        bridge.on_sync(EventKind::KeyDown, labelled(&log, "first"));
        bridge.on_sync(EventKind::KeyDown, labelled(&log, "second"));

        bridge.emit(key_down()).await;

        assert_eq!(log.lock().as_slice(), &["first", "second", "wildcard"]);
    }

    #[tokio::test]
    async fn test_propagation_stop_halts_later_listeners() {
        let bridge = unbatched_bridge();
        let log = Arc::new(Mutex::new(Vec::new()));

        bridge.on_sync(EventKind::KeyDown, labelled(&log, "before"));
        bridge.on_sync(EventKind::KeyDown, {
            let log = log.clone();
            move |event| {
                log.lock().push("stopper");
                event.stop_propagation();
            }
        });
        bridge.on_sync(EventKind::KeyDown, labelled(&log, "after"));
        bridge.on_any({
            let log = log.clone();
            move |_event| {
                let log = log.clone();
                async move {
                    log.lock().push("wildcard");
                    Ok(())
                }
            }
        });

        bridge.emit(key_down()).await;

        // Listeners before the stopper ran; later ones and wildcards did not.
        assert_eq!(log.lock().as_slice(), &["before", "stopper"]);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_abort_dispatch() {
        let bridge = unbatched_bridge();
        let log = Arc::new(Mutex::new(Vec::new()));

        bridge.on(EventKind::KeyDown, |_event| async {
            Err(ListenerError::Failed("deliberate".into()))
        });
        bridge.on_sync(EventKind::KeyDown, labelled(&log, "survivor"));

        bridge.emit(key_down()).await;
        bridge.emit(key_down()).await;

        assert_eq!(log.lock().as_slice(), &["survivor", "survivor"]);
        // Exactly one error per faulty invocation, against KeyDown only.
        let stats = bridge.stats();
        assert_eq!(stats.per_kind[&EventKind::KeyDown].error_count, 2);
        assert_eq!(stats.per_kind[&EventKind::KeyDown].count, 2);
    }

    #[tokio::test]
    async fn test_once_listener_fires_exactly_once() {
        let bridge = unbatched_bridge();
        let count = Arc::new(Mutex::new(0usize));

        let sink = count.clone();
        bridge.once(EventKind::KeyDown, move |_event| {
            let sink = sink.clone();
            async move {
                *sink.lock() += 1;
                Ok(())
            }
        });

        for _ in 0..3 {
            bridge.emit(key_down()).await;
        }

        assert_eq!(*count.lock(), 1);
        assert_eq!(bridge.listener_count(ListenerKey::Kind(EventKind::KeyDown)), 0);
    }

    #[tokio::test]
    async fn test_once_listener_not_reinvoked_by_reentrant_emission() {
        let bridge = Arc::new(unbatched_bridge());
        let count = Arc::new(Mutex::new(0usize));

        let sink = count.clone();
        bridge.once(EventKind::KeyDown, move |_event| {
            let sink = sink.clone();
            async move {
                *sink.lock() += 1;
                Ok(())
            }
        });

        // A later listener in the same pass re-enters emit for the same
        // kind; the nested dispatch must not see the spent once listener.
        let reentrant = bridge.clone();
        let reentered = Arc::new(Mutex::new(false));
        bridge.on(EventKind::KeyDown, move |_event| {
            let bridge = reentrant.clone();
            let reentered = reentered.clone();
            async move {
                let first = !std::mem::replace(&mut *reentered.lock(), true);
                if first {
                    bridge.emit(key_down()).await;
                }
                Ok(())
            }
        });

        bridge.emit(key_down()).await;
        assert_eq!(*count.lock(), 1);
        assert_eq!(bridge.listener_count(ListenerKey::Kind(EventKind::KeyDown)), 1);
    }

    #[tokio::test]
    async fn test_once_listener_removed_even_after_fault() {
        let bridge = unbatched_bridge();

        bridge.add_listener(
            ListenerKey::Kind(EventKind::KeyDown),
            Arc::new(|_event| -> event_bridge::ListenerFuture {
                Box::pin(async { Err(ListenerError::Failed("boom".into())) })
            }),
            event_bridge::ListenerOptions {
                once: true,
                ..Default::default()
            },
        );

        bridge.emit(key_down()).await;
        assert_eq!(bridge.listener_count(ListenerKey::Kind(EventKind::KeyDown)), 0);

        bridge.emit(key_down()).await;
        // Only the first emission produced an error.
        assert_eq!(bridge.stats().per_kind[&EventKind::KeyDown].error_count, 1);
    }

    #[tokio::test]
    async fn test_filter_veto_scoped_to_kind() {
        let bridge = unbatched_bridge();
        let log = Arc::new(Mutex::new(Vec::new()));

        bridge.on_sync(EventKind::KeyDown, labelled(&log, "down"));
        bridge.on_sync(EventKind::KeyUp, labelled(&log, "up"));
        bridge.add_filter(EventKind::KeyDown, Arc::new(|_event| false));

        bridge.emit(key_down()).await;
        bridge.emit(key_up()).await;
        bridge.emit(key_down()).await;

        assert_eq!(log.lock().as_slice(), &["up"]);
        assert_eq!(bridge.stats().dropped.filtered, 2);
    }

    #[tokio::test]
    async fn test_transformer_chain_feeds_forward() {
        let bridge = unbatched_bridge();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bridge.on_sync(EventKind::PointerDown, move |event| {
            sink.lock().push(event.payload.clone());
        });
        // First transformer shifts x; second doubles it.
        bridge.add_transformer(
            EventKind::PointerDown,
            Arc::new(|mut event| {
                if let EventPayload::Pointer { x, .. } = &mut event.payload {
                    *x += 10.0;
                }
                Some(event)
            }),
        );
        bridge.add_transformer(
            EventKind::PointerDown,
            Arc::new(|mut event| {
                if let EventPayload::Pointer { x, .. } = &mut event.payload {
                    *x *= 2.0;
                }
                Some(event)
            }),
        );

        bridge
            .emit(EventSubmission::normal(
                EventKind::PointerDown,
                EventPayload::pointer(5.0, 0.0),
                EventSource::Interaction,
            ))
            .await;

        let payloads = seen.lock();
        match payloads.first() {
            Some(EventPayload::Pointer { x, .. }) => assert_eq!(*x, 30.0),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listener_cap_refuses_without_failing() {
        let mut config = BridgeConfig::default();
        config.max_listeners_per_kind = 2;
        config.batching_enabled = false;
        let bridge = EventBridge::with_config(config);

        assert!(bridge.on_sync(EventKind::Wheel, |_| {}).is_some());
        assert!(bridge.on_sync(EventKind::Wheel, |_| {}).is_some());
        assert!(bridge.on_sync(EventKind::Wheel, |_| {}).is_none());
        assert_eq!(bridge.listener_count(ListenerKey::Kind(EventKind::Wheel)), 2);

        // Emission still works for the registered pair.
        bridge
            .emit(EventSubmission::normal(
                EventKind::Wheel,
                EventPayload::Wheel {
                    delta_x: 0.0,
                    delta_y: 1.0,
                    x: 0.0,
                    y: 0.0,
                },
                EventSource::Interaction,
            ))
            .await;
        assert_eq!(bridge.events_processed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_listener_completion_is_ignored() {
        let mut config = BridgeConfig::default();
        config.batching_enabled = false;
        config.dedup_enabled = false;
        config.listener_timeout = Duration::from_millis(10);
        let bridge = EventBridge::with_config(config);
        let late = Arc::new(Mutex::new(false));

        let flag = late.clone();
        bridge.on(EventKind::KeyDown, move |_event| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                *flag.lock() = true;
                Ok(())
            }
        });

        bridge.emit(key_down()).await;

        // The dispatch pass finished at the timeout; the listener body never
        // resumed (its future was dropped at the race).
        assert!(!*late.lock());
        assert_eq!(bridge.stats().per_kind[&EventKind::KeyDown].error_count, 1);
    }

    #[tokio::test]
    async fn test_listener_can_reenter_bridge() {
        let bridge = Arc::new(unbatched_bridge());
        let log = Arc::new(Mutex::new(Vec::new()));

        let reentrant = bridge.clone();
        let sink = log.clone();
        bridge.on_sync(EventKind::KeyDown, move |_event| {
            sink.lock().push("down");
            // Registering from inside a dispatch pass must not deadlock.
            let sink = sink.clone();
            reentrant.on_sync(EventKind::KeyUp, move |_event| sink.lock().push("up"));
        });

        bridge.emit(key_down()).await;
        bridge.emit(key_up()).await;

        assert_eq!(log.lock().as_slice(), &["down", "up"]);
    }
}

//! # Deduplication Through the Full Pipeline
//!
//! Movement events that land in the same quantized grid cell within the
//! dedup window collapse to one delivery; distant or late events deliver.
//! Runs on the paused tokio clock so the window is deterministic.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use event_bridge::{
        ConfigUpdate, EventBridge, EventKind, EventPayload, EventPriority, EventSource,
        EventSubmission,
    };

    use crate::integration::{init_logging, Recorder};

    fn pointer_move(x: f32, y: f32) -> EventSubmission {
        EventSubmission::normal(
            EventKind::PointerMove,
            EventPayload::pointer(x, y),
            EventSource::Interaction,
        )
    }

    fn wired_bridge() -> (EventBridge, Recorder) {
        let bridge = EventBridge::new();
        let recorder = Recorder::new();
        let sink = recorder.clone();
        bridge.on_any(move |event| {
            let sink = sink.clone();
            async move {
                sink.record(&event);
                Ok(())
            }
        });
        (bridge, recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_cell_within_window_delivers_once() {
        init_logging();
        let (bridge, recorder) = wired_bridge();

        bridge.emit(pointer_move(10.0, 20.0)).await;
        tokio::time::advance(Duration::from_millis(5)).await;
        // (12, 21) quantizes to the same 5-unit cell as (10, 20).
        bridge.emit(pointer_move(12.0, 21.0)).await;

        bridge.wait_idle().await;

        // Exactly one delivery, carrying the first event's payload.
        assert_eq!(recorder.len(), 1);
        assert_eq!(
            recorder.payloads(),
            vec![EventPayload::pointer(10.0, 20.0)]
        );
        assert_eq!(bridge.stats().dropped.duplicate, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outside_window_both_deliver() {
        let (bridge, recorder) = wired_bridge();

        bridge.emit(pointer_move(10.0, 20.0)).await;
        tokio::time::advance(Duration::from_millis(20)).await;
        bridge.emit(pointer_move(10.0, 20.0)).await;

        bridge.wait_idle().await;
        assert_eq!(recorder.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_cells_both_deliver() {
        let (bridge, recorder) = wired_bridge();

        bridge.emit(pointer_move(10.0, 20.0)).await;
        bridge.emit(pointer_move(80.0, 90.0)).await;

        bridge.wait_idle().await;
        assert_eq!(recorder.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discrete_events_never_deduped() {
        let (bridge, recorder) = wired_bridge();
        let down = |x, y| {
            EventSubmission::normal(
                EventKind::PointerDown,
                EventPayload::pointer(x, y),
                EventSource::Interaction,
            )
        };

        bridge.emit(down(10.0, 20.0)).await;
        bridge.emit(down(10.0, 20.0)).await;

        bridge.wait_idle().await;
        assert_eq!(recorder.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dedup_toggle_disables_suppression() {
        let (bridge, recorder) = wired_bridge();
        bridge.configure(ConfigUpdate {
            dedup: Some(false),
            ..ConfigUpdate::default()
        });

        bridge.emit(pointer_move(10.0, 20.0)).await;
        bridge.emit(pointer_move(12.0, 21.0)).await;

        bridge.wait_idle().await;
        assert_eq!(recorder.len(), 2);
    }

    /// The end-to-end scenario from the bridge's contract: a jittery pointer
    /// move pair collapses to one delivery, and an urgent key press emitted
    /// afterwards is still dispatched before the batched move drains.
    #[tokio::test(start_paused = true)]
    async fn test_jitter_collapses_and_urgent_key_overtakes() {
        let (bridge, recorder) = wired_bridge();

        bridge.emit(pointer_move(10.0, 20.0)).await;
        tokio::time::advance(Duration::from_millis(5)).await;
        bridge.emit(pointer_move(12.0, 21.0)).await;

        bridge
            .emit(EventSubmission::new(
                EventKind::KeyDown,
                EventPayload::key("Escape", "Escape"),
                EventPriority::Immediate,
                EventSource::Interaction,
            ))
            .await;

        // Key dispatched ahead of the queued move; move arrives on the tick.
        assert_eq!(recorder.kinds(), vec![EventKind::KeyDown]);

        bridge.on_frame().await;
        assert_eq!(
            recorder.kinds(),
            vec![EventKind::KeyDown, EventKind::PointerMove]
        );
        assert_eq!(
            recorder.payloads()[1],
            EventPayload::pointer(10.0, 20.0)
        );
    }
}

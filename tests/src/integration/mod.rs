//! Cross-component integration scenarios for the priority event bridge.

pub mod dedup_flow;
pub mod dispatch;

use bridge_types::{BridgeEvent, EventKind, EventPayload};
use parking_lot::Mutex;
use std::sync::Arc;

/// Install the test log subscriber; honors `RUST_LOG`, idempotent.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared recorder capturing delivery order across listeners.
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<(EventKind, EventPayload)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &BridgeEvent) {
        self.entries.lock().push((event.kind, event.payload.clone()));
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.entries.lock().iter().map(|(kind, _)| *kind).collect()
    }

    pub fn payloads(&self) -> Vec<EventPayload> {
        self.entries
            .lock()
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Frame numbers of recorded `Frame` payloads, in delivery order.
    pub fn frame_numbers(&self) -> Vec<u64> {
        self.entries
            .lock()
            .iter()
            .filter_map(|(_, payload)| match payload {
                EventPayload::Frame { frame_number } => Some(*frame_number),
                _ => None,
            })
            .collect()
    }
}

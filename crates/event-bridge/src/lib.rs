//! # Event Bridge - Priority Event Bus for the Canvas SDK
//!
//! Single-process event bus between the interaction-input layer and the
//! render/scene layer. Events are reordered by urgency across five tiers,
//! noisy movement events are deduplicated, low-urgency work is batched to
//! frame boundaries, and dispatch runs under per-listener timeout and fault
//! isolation.
//!
//! ```text
//! ┌──────────────┐  emit()                       ┌──────────────┐
//! │ Interaction  │ ───────┐              ┌────── │ Scene/Render │
//! └──────────────┘        ▼              ▼       └──────────────┘
//!                   ┌───────────────────────┐
//!                   │     Event Bridge      │
//!                   │ dedup → transform →   │
//!                   │ filter → tier queues  │
//!                   └──────────┬────────────┘
//!                              │ on_frame() drains by priority
//!                              ▼
//!                    listeners (kind, then '*')
//! ```
//!
//! ## Guarantees
//!
//! - Within one tier, FIFO; across tiers, strict priority. `Immediate`
//!   events bypass batching entirely.
//! - Delivery is best-effort: full tiers drop new work (backpressure), and
//!   there is no real-time deadline, only time-sliced cooperative drains.
//! - Dispatch is awaited per event, so delivery order equals dequeue order.
//! - No listener fault ever reaches the emitting subsystem.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bridge;
pub mod dedup;
pub mod queue;
pub mod registry;
pub mod stats;

// Re-export main types
pub use bridge::{EventBridge, EventEmitter};
pub use dedup::Deduplicator;
pub use queue::PriorityQueueManager;
pub use registry::{
    EventListener, FilterFn, FilterId, FilterRegistry, ListenerFn, ListenerFuture, ListenerId,
    ListenerKey, ListenerOptions, ListenerRegistry, TransformerFn, TransformerId,
    TransformerRegistry,
};
pub use stats::{BridgeStats, DropReason, DroppedStats, KindStats, KindStatsSnapshot};

// The event model is re-exported so most consumers depend on one crate.
pub use bridge_types::{
    BridgeConfig, BridgeEvent, ConfigUpdate, EventKind, EventPayload, EventPriority, EventSource,
    EventSubmission, ListenerError, Modifiers, TouchPoint,
};

use lazy_static::lazy_static;

lazy_static! {
    /// Process-wide default bridge, created on first use.
    static ref DEFAULT_BRIDGE: EventBridge = EventBridge::new();
}

/// The process-wide default bridge instance.
///
/// A convenience for hosts that want one shared bus; subsystems needing
/// isolation should construct private `EventBridge` instances instead. The
/// default instance lives for the process lifetime; `dispose` disables it
/// permanently.
#[must_use]
pub fn default_bridge() -> &'static EventBridge {
    &DEFAULT_BRIDGE
}

//! # Bridge Types - Event Model for the Priority Event Bridge
//!
//! Defines the closed event catalog, the five-tier priority model, typed
//! payloads, and tunable configuration shared by the bridge and its two
//! producing subsystems (interaction layer and render/scene layer).
//!
//! ## Design Rules
//!
//! - Every event kind has a concrete payload shape (no untyped bags);
//!   `EventPayload::Opaque` exists only as a forward-compatibility escape
//!   hatch for host extensions.
//! - An event is immutable after construction except for its two dispatch
//!   flags (`propagation_stopped`, `default_prevented`), which are atomics so
//!   listeners can set them through a shared `Arc<BridgeEvent>`.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod errors;
pub mod events;

// Re-export main types
pub use config::{BridgeConfig, ConfigUpdate};
pub use errors::ListenerError;
pub use events::{
    BridgeEvent, EventKind, EventPayload, EventPriority, EventSource, EventSubmission, Modifiers,
    TouchPoint,
};

use std::time::Duration;

/// Maximum queued events per priority tier before backpressure drops.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// Maximum listeners per event kind (and for the wildcard set).
pub const DEFAULT_MAX_LISTENERS_PER_KIND: usize = 50;

/// Per-listener invocation timeout.
pub const DEFAULT_LISTENER_TIMEOUT: Duration = Duration::from_secs(5);

/// Window within which near-duplicate movement events collapse (~one frame).
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_millis(16);

/// Coordinate grid for movement-event deduplication, in canvas units.
pub const DEFAULT_DEDUP_GRID: f32 = 5.0;

/// Time slice for one deferred drain pass.
pub const DEFAULT_DRAIN_BUDGET: Duration = Duration::from_millis(5);

/// One frame at 60 Hz; dispatch passes longer than this log a warning.
pub const FRAME_BUDGET: Duration = Duration::from_millis(16);

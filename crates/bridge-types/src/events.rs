//! # Canvas Events
//!
//! The closed catalog of events that flow through the bridge, their typed
//! payloads, and the five-tier priority model.
//!
//! Producers choose the priority at emit time; it is independent of any
//! priority hint attached to a listener.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;
use uuid::Uuid;

/// All event kinds the bridge accepts.
///
/// The catalog is closed: the two producing subsystems emit exactly these
/// kinds, and listener/filter/transformer registries are keyed by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    // Interaction layer: pointer
    PointerDown,
    PointerMove,
    PointerUp,
    Wheel,

    // Interaction layer: touch
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,

    // Interaction layer: keyboard
    KeyDown,
    KeyUp,

    // Interaction layer: recognized gestures
    GestureStart,
    GestureChange,
    GestureEnd,

    // Scene layer
    SceneUpdate,
    SelectionChange,
    TransformChange,

    // Frame lifecycle
    RenderStart,
    RenderEnd,
    FrameStart,
    FrameEnd,
}

impl EventKind {
    /// High-frequency movement kinds subject to deduplication.
    #[must_use]
    pub fn is_movement(self) -> bool {
        matches!(self, Self::PointerMove | Self::TouchMove)
    }

    /// Kinds produced by the interaction layer.
    #[must_use]
    pub fn is_input(self) -> bool {
        matches!(
            self,
            Self::PointerDown
                | Self::PointerMove
                | Self::PointerUp
                | Self::Wheel
                | Self::TouchStart
                | Self::TouchMove
                | Self::TouchEnd
                | Self::TouchCancel
                | Self::KeyDown
                | Self::KeyUp
                | Self::GestureStart
                | Self::GestureChange
                | Self::GestureEnd
        )
    }

    /// Frame lifecycle kinds (render/frame start and end).
    #[must_use]
    pub fn is_lifecycle(self) -> bool {
        matches!(
            self,
            Self::RenderStart | Self::RenderEnd | Self::FrameStart | Self::FrameEnd
        )
    }
}

/// Urgency tiers, ordered most-to-least urgent.
///
/// `Immediate` work is never deferred to a frame tick; every other tier is
/// drained in strict order `High > Normal > Low > Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventPriority {
    /// Dispatched synchronously, bypassing the frame-tick queue.
    Immediate,
    /// Drained first within a frame tick.
    High,
    /// Default tier for producer emissions.
    Normal,
    /// Background work.
    Low,
    /// Drained only when everything else is empty.
    Idle,
}

impl EventPriority {
    /// Number of tiers.
    pub const COUNT: usize = 5;

    /// All tiers in drain order.
    pub const ALL: [Self; Self::COUNT] =
        [Self::Immediate, Self::High, Self::Normal, Self::Low, Self::Idle];

    /// Tier index for per-tier storage (0 = most urgent).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Immediate => 0,
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
            Self::Idle => 4,
        }
    }
}

/// The subsystem that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    /// The interaction-input layer (pointer/touch/keyboard/gestures).
    Interaction,
    /// The render/scene layer (scene graph, selection, frame lifecycle).
    Scene,
}

/// Keyboard modifier state captured with input events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// One active touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Host-assigned contact identifier, stable for the contact's lifetime.
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

/// Typed payloads, one shape per kind family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// Pointer down/move/up position in canvas coordinates.
    Pointer {
        x: f32,
        y: f32,
        /// Pressed button index, if any (0 = primary).
        button: Option<u8>,
        modifiers: Modifiers,
    },

    /// Wheel scroll deltas plus the pointer position at scroll time.
    Wheel {
        delta_x: f32,
        delta_y: f32,
        x: f32,
        y: f32,
    },

    /// Active touch contacts; the first entry is the primary contact.
    Touch { touches: Vec<TouchPoint> },

    /// Key down/up.
    Key {
        key: String,
        code: String,
        modifiers: Modifiers,
    },

    /// Recognized pinch/rotate gesture state.
    Gesture {
        scale: f32,
        rotation: f32,
        center_x: f32,
        center_y: f32,
    },

    /// Scene-graph objects created, mutated, or removed.
    Scene { object_ids: Vec<Uuid> },

    /// Current selection set.
    Selection { selected: Vec<Uuid> },

    /// One object's transform changed (2D affine, row-major `[a b c d tx ty]`).
    Transform { object_id: Uuid, matrix: [f32; 6] },

    /// Frame/render lifecycle marker.
    Frame { frame_number: u64 },

    /// Escape hatch for host extensions; not interpreted by the bridge.
    Opaque(serde_json::Value),
}

impl EventPayload {
    /// Convenience constructor for a plain pointer position.
    #[must_use]
    pub fn pointer(x: f32, y: f32) -> Self {
        Self::Pointer {
            x,
            y,
            button: None,
            modifiers: Modifiers::default(),
        }
    }

    /// Convenience constructor for a single-contact touch.
    #[must_use]
    pub fn touch(id: u64, x: f32, y: f32) -> Self {
        Self::Touch {
            touches: vec![TouchPoint { id, x, y }],
        }
    }

    /// Convenience constructor for a key event without modifiers.
    #[must_use]
    pub fn key(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            code: code.into(),
            modifiers: Modifiers::default(),
        }
    }

    /// Convenience constructor for a frame lifecycle marker.
    #[must_use]
    pub fn frame(frame_number: u64) -> Self {
        Self::Frame { frame_number }
    }

    /// The primary position carried by this payload, if it has one.
    ///
    /// Pointer and wheel payloads report their own position, touch payloads
    /// the first contact, gestures their center. Used by the deduplicator to
    /// quantize movement events onto a coarse grid.
    #[must_use]
    pub fn primary_position(&self) -> Option<(f32, f32)> {
        match self {
            Self::Pointer { x, y, .. } | Self::Wheel { x, y, .. } => Some((*x, *y)),
            Self::Touch { touches } => touches.first().map(|t| (t.x, t.y)),
            Self::Gesture {
                center_x, center_y, ..
            } => Some((*center_x, *center_y)),
            _ => None,
        }
    }
}

/// The unit of work flowing through the bridge.
///
/// Immutable once constructed, except for the two dispatch flags. Events are
/// shared as `Arc<BridgeEvent>` during dispatch so listeners can set the
/// flags without exclusive access.
#[derive(Debug)]
pub struct BridgeEvent {
    /// Globally unique id for tracing and diagnostics.
    pub id: Uuid,
    pub kind: EventKind,
    pub priority: EventPriority,
    pub source: EventSource,
    pub payload: EventPayload,
    /// Monotonic creation time.
    pub timestamp: Instant,

    propagation_stopped: AtomicBool,
    default_prevented: AtomicBool,
}

impl BridgeEvent {
    /// Construct an event stamped with the current monotonic time.
    #[must_use]
    pub fn new(
        kind: EventKind,
        payload: EventPayload,
        priority: EventPriority,
        source: EventSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            priority,
            source,
            payload,
            timestamp: Instant::now(),
            propagation_stopped: AtomicBool::new(false),
            default_prevented: AtomicBool::new(false),
        }
    }

    /// Stop notification of listeners after the current one.
    ///
    /// Cooperative only: a listener already running is unaffected.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::SeqCst);
    }

    /// Whether a listener has stopped propagation for this event.
    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.load(Ordering::SeqCst)
    }

    /// Mark the host's default handling of this event as suppressed.
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    /// Whether a listener has suppressed default handling.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

impl Clone for BridgeEvent {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            priority: self.priority,
            source: self.source,
            payload: self.payload.clone(),
            timestamp: self.timestamp,
            propagation_stopped: AtomicBool::new(self.propagation_stopped()),
            default_prevented: AtomicBool::new(self.default_prevented()),
        }
    }
}

/// A producer-facing event draft consumed by `emit`/`emit_batch`.
#[derive(Debug, Clone)]
pub struct EventSubmission {
    pub kind: EventKind,
    pub payload: EventPayload,
    pub priority: EventPriority,
    pub source: EventSource,
}

impl EventSubmission {
    /// Submission at an explicit priority.
    #[must_use]
    pub fn new(
        kind: EventKind,
        payload: EventPayload,
        priority: EventPriority,
        source: EventSource,
    ) -> Self {
        Self {
            kind,
            payload,
            priority,
            source,
        }
    }

    /// Submission at the default `Normal` priority.
    #[must_use]
    pub fn normal(kind: EventKind, payload: EventPayload, source: EventSource) -> Self {
        Self::new(kind, payload, EventPriority::Normal, source)
    }

    /// Submission at `Immediate` priority (bypasses batching).
    #[must_use]
    pub fn immediate(kind: EventKind, payload: EventPayload, source: EventSource) -> Self {
        Self::new(kind, payload, EventPriority::Immediate, source)
    }

    /// Build the event this submission describes.
    #[must_use]
    pub fn into_event(self) -> BridgeEvent {
        BridgeEvent::new(self.kind, self.payload, self.priority, self.source)
    }
}

//! # Movement-Event Deduplicator
//!
//! Collapses near-identical high-frequency events (pointer/touch movement)
//! within a short window so one frame's worth of jitter delivers once.
//!
//! ## Keying
//!
//! - Movement kinds: `(kind, position quantized to a coarse grid)`, so two
//!   moves landing in the same grid cell within the window are duplicates.
//! - Every other kind is unique per event; dedup is a no-op for them and no
//!   table entry is recorded.
//!
//! Stale keys are evicted opportunistically: entries older than twice the
//! window are dropped, at most once per window.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use bridge_types::{BridgeEvent, EventKind};

/// Last-seen key for a movement event: kind plus quantized grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DedupKey {
    kind: EventKind,
    cell_x: i64,
    cell_y: i64,
}

/// Time-bounded last-seen table for movement events.
#[derive(Debug)]
pub struct Deduplicator {
    last_seen: HashMap<DedupKey, Instant>,
    window: Duration,
    grid: f32,
    last_evict: Instant,
}

impl Deduplicator {
    /// Create a deduplicator with the given window and quantization grid.
    #[must_use]
    pub fn new(window: Duration, grid: f32) -> Self {
        Self {
            last_seen: HashMap::new(),
            window,
            grid,
            last_evict: Instant::now(),
        }
    }

    /// Check whether this event duplicates a recently seen one.
    ///
    /// Side effects: records the event's key on a miss and opportunistically
    /// evicts stale keys. Always returns a boolean; discrete (non-movement)
    /// kinds are never duplicates.
    pub fn is_duplicate(&mut self, event: &BridgeEvent) -> bool {
        if !event.kind.is_movement() {
            return false;
        }
        let Some((x, y)) = event.payload.primary_position() else {
            return false;
        };

        let key = DedupKey {
            kind: event.kind,
            cell_x: self.quantize(x),
            cell_y: self.quantize(y),
        };
        let now = Instant::now();
        self.maybe_evict(now);

        match self.last_seen.get(&key) {
            Some(&seen) if now.duration_since(seen) < self.window => true,
            _ => {
                self.last_seen.insert(key, now);
                false
            }
        }
    }

    /// Drop all last-seen state.
    pub fn clear(&mut self) {
        self.last_seen.clear();
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    /// The configured dedup window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn quantize(&self, coord: f32) -> i64 {
        (coord / self.grid).round() as i64
    }

    /// Evict keys older than twice the window, at most once per window.
    fn maybe_evict(&mut self, now: Instant) {
        if now.duration_since(self.last_evict) < self.window {
            return;
        }
        let horizon = self.window * 2;
        self.last_seen
            .retain(|_, &mut seen| now.duration_since(seen) <= horizon);
        self.last_evict = now;
    }
}

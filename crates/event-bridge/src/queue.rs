//! # Priority Queue Manager
//!
//! One FIFO sequence per priority tier with a shared per-tier capacity
//! ceiling. Enqueueing past capacity is the system's backpressure: the event
//! is dropped and the producer informed only via the boolean return and a
//! log line; nothing is retried.
//!
//! ## Invariants
//!
//! - Within one tier, events drain in FIFO order.
//! - Across tiers, strict priority: a tier drains only when every more
//!   urgent tier is empty.
//! - At most one drain runs at a time (`begin_drain` re-entrancy guard).
//!
//! Drain passes themselves are driven by the bridge, which pops events one
//! at a time and dispatches them against a time budget.

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

use bridge_types::{BridgeEvent, EventPriority};

/// Per-tier FIFO queues plus drain-scheduling state.
#[derive(Debug)]
pub struct PriorityQueueManager {
    queues: [VecDeque<Arc<BridgeEvent>>; EventPriority::COUNT],
    max_queue_size: usize,
    drain_scheduled: bool,
    draining: bool,
}

impl PriorityQueueManager {
    /// Create a manager with the given per-tier capacity.
    #[must_use]
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            queues: std::array::from_fn(|_| VecDeque::new()),
            max_queue_size,
            drain_scheduled: false,
            draining: false,
        }
    }

    /// Append an event to its tier's queue.
    ///
    /// Returns `false` (and logs) when the tier is at capacity; the event is
    /// dropped, not buffered.
    pub fn enqueue(&mut self, event: Arc<BridgeEvent>) -> bool {
        let tier = event.priority;
        let queue = &mut self.queues[tier.index()];
        if queue.len() >= self.max_queue_size {
            warn!(
                ?tier,
                kind = ?event.kind,
                capacity = self.max_queue_size,
                "tier queue full, dropping event"
            );
            return false;
        }
        queue.push_back(event);
        true
    }

    /// Pop the head of the highest non-empty tier.
    pub fn pop_next(&mut self) -> Option<Arc<BridgeEvent>> {
        self.queues.iter_mut().find_map(VecDeque::pop_front)
    }

    /// Whether the `Immediate` tier holds work that must drain synchronously.
    #[must_use]
    pub fn has_urgent(&self) -> bool {
        !self.queues[EventPriority::Immediate.index()].is_empty()
    }

    /// Queue depth of one tier.
    #[must_use]
    pub fn depth(&self, tier: EventPriority) -> usize {
        self.queues[tier.index()].len()
    }

    /// Queue depths in tier order, most urgent first.
    #[must_use]
    pub fn depths(&self) -> [usize; EventPriority::COUNT] {
        std::array::from_fn(|i| self.queues[i].len())
    }

    /// Total queued events across all tiers.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// Whether every tier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Mark a drain as wanted for the next frame tick.
    ///
    /// Returns `true` if this call newly scheduled it.
    pub fn schedule_drain(&mut self) -> bool {
        let newly = !self.drain_scheduled;
        self.drain_scheduled = true;
        newly
    }

    /// Whether a drain is scheduled for the next frame tick.
    #[must_use]
    pub fn drain_scheduled(&self) -> bool {
        self.drain_scheduled
    }

    /// Try to enter a drain pass. Returns `false` if one is already running.
    pub fn begin_drain(&mut self) -> bool {
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }

    /// Leave a drain pass; `reschedule` keeps the drain flag set for the
    /// next frame tick when budget expired with work remaining.
    pub fn end_drain(&mut self, reschedule: bool) {
        self.draining = false;
        self.drain_scheduled = reschedule;
    }

    /// Drop all queued events and clear scheduling state.
    ///
    /// Returns the number of events discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.total_len();
        for queue in &mut self.queues {
            queue.clear();
        }
        self.drain_scheduled = false;
        dropped
    }

    /// Change the per-tier capacity; applies to subsequent enqueues only.
    pub fn set_max_queue_size(&mut self, max_queue_size: usize) {
        self.max_queue_size = max_queue_size;
    }
}

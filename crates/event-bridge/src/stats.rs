//! # Bridge Statistics
//!
//! Per-kind dispatch counters and timings plus a drop breakdown by cause.
//! `EventBridge::stats` assembles these into a serializable read-only
//! snapshot for diagnostics and telemetry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use bridge_types::{EventKind, EventPriority};

/// Why an emitted event never reached dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Suppressed by the deduplicator.
    Duplicate,
    /// A transformer returned `None`.
    Transformed,
    /// A filter returned `false`.
    Filtered,
    /// Target tier was at capacity.
    Capacity,
    /// Bridge was disabled or disposed.
    Disabled,
}

/// Drop counters by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedStats {
    pub duplicate: u64,
    pub transformed: u64,
    pub filtered: u64,
    pub capacity: u64,
    pub disabled: u64,
}

impl DroppedStats {
    /// Total events dropped before dispatch.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.duplicate + self.transformed + self.filtered + self.capacity + self.disabled
    }
}

/// Running per-kind dispatch accounting.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindStats {
    pub count: u64,
    pub error_count: u64,
    pub last: Duration,
    pub total: Duration,
}

impl KindStats {
    /// Mean dispatch duration for this kind.
    #[must_use]
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / u32::try_from(self.count).unwrap_or(u32::MAX)
        }
    }
}

/// Serializable per-kind snapshot, durations in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KindStatsSnapshot {
    pub count: u64,
    pub error_count: u64,
    pub last_ms: f64,
    pub average_ms: f64,
    pub total_ms: f64,
}

impl From<&KindStats> for KindStatsSnapshot {
    fn from(stats: &KindStats) -> Self {
        Self {
            count: stats.count,
            error_count: stats.error_count,
            last_ms: stats.last.as_secs_f64() * 1000.0,
            average_ms: stats.average().as_secs_f64() * 1000.0,
            total_ms: stats.total.as_secs_f64() * 1000.0,
        }
    }
}

/// Read-only aggregate snapshot returned by `EventBridge::stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Events accepted by `emit` while the bridge was enabled, including
    /// ones later dropped by dedup, transformers, filters, or capacity.
    /// Emissions refused while disabled count only under `dropped.disabled`.
    pub events_emitted: u64,
    /// Events that completed a dispatch pass.
    pub events_processed: u64,
    /// Drop breakdown by cause.
    pub dropped: DroppedStats,
    /// Queue depths in tier order, most urgent first.
    pub queue_depths: [usize; EventPriority::COUNT],
    /// Listener set sizes by kind label (`"*"` for the wildcard set).
    pub listener_counts: HashMap<String, usize>,
    /// Per-kind dispatch statistics.
    pub per_kind: HashMap<EventKind, KindStatsSnapshot>,
    /// Milliseconds since the bridge was constructed.
    pub uptime_ms: u64,
}

/// Mutable accumulator owned by the bridge.
#[derive(Debug, Default)]
pub struct StatsCollector {
    per_kind: HashMap<EventKind, KindStats>,
    dropped: DroppedStats,
}

impl StatsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed dispatch pass.
    pub fn record_dispatch(&mut self, kind: EventKind, elapsed: Duration, errors: u64) {
        let stats = self.per_kind.entry(kind).or_default();
        stats.count += 1;
        stats.error_count += errors;
        stats.last = elapsed;
        stats.total += elapsed;
    }

    /// Record one pre-dispatch drop.
    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::Duplicate => self.dropped.duplicate += 1,
            DropReason::Transformed => self.dropped.transformed += 1,
            DropReason::Filtered => self.dropped.filtered += 1,
            DropReason::Capacity => self.dropped.capacity += 1,
            DropReason::Disabled => self.dropped.disabled += 1,
        }
    }

    /// Per-kind accounting for one kind, if any dispatch has been recorded.
    #[must_use]
    pub fn kind_stats(&self, kind: EventKind) -> Option<&KindStats> {
        self.per_kind.get(&kind)
    }

    /// Current drop counters.
    #[must_use]
    pub fn dropped(&self) -> DroppedStats {
        self.dropped
    }

    /// Assemble the serializable snapshot.
    #[must_use]
    pub fn snapshot(
        &self,
        events_emitted: u64,
        events_processed: u64,
        queue_depths: [usize; EventPriority::COUNT],
        listener_counts: HashMap<String, usize>,
        uptime: Duration,
    ) -> BridgeStats {
        BridgeStats {
            events_emitted,
            events_processed,
            dropped: self.dropped,
            queue_depths,
            listener_counts,
            per_kind: self
                .per_kind
                .iter()
                .map(|(kind, stats)| (*kind, KindStatsSnapshot::from(stats)))
                .collect(),
            uptime_ms: u64::try_from(uptime.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        self.per_kind.clear();
        self.dropped = DroppedStats::default();
    }
}

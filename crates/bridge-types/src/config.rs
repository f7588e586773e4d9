//! Configuration for the priority event bridge.
//!
//! All tunables the host treats as configuration rather than protocol:
//! queue/listener capacities, the dedup window and grid, timeouts, drain
//! budgets, and the interaction thresholds the input layer reads.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    DEFAULT_DEDUP_GRID, DEFAULT_DEDUP_WINDOW, DEFAULT_DRAIN_BUDGET, DEFAULT_LISTENER_TIMEOUT,
    DEFAULT_MAX_LISTENERS_PER_KIND, DEFAULT_MAX_QUEUE_SIZE, FRAME_BUDGET,
};

/// Bridge configuration.
///
/// Feature toggles take effect for subsequent `emit` calls only; capacity
/// changes apply to subsequent enqueue/registration attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Defer non-immediate events to frame-tick drains.
    pub batching_enabled: bool,
    /// Suppress near-duplicate movement events.
    pub dedup_enabled: bool,
    /// Collect per-kind dispatch statistics.
    pub stats_enabled: bool,
    /// Apply registered pre-dispatch filters.
    pub filtering_enabled: bool,

    /// Per-tier queue capacity; excess enqueues are dropped (backpressure).
    pub max_queue_size: usize,
    /// Per-kind listener cap; registrations beyond it are refused.
    pub max_listeners_per_kind: usize,
    /// Each listener invocation is raced against this timeout.
    pub listener_timeout: Duration,
    /// Movement events within this window collapse to one delivery.
    pub dedup_window: Duration,
    /// Coordinate quantization grid for movement dedup, in canvas units.
    pub dedup_grid: f32,
    /// Time slice for one deferred drain pass.
    pub drain_budget: Duration,
    /// Dispatch passes longer than this log a performance warning.
    pub frame_budget: Duration,

    /// Interaction thresholds consumed by the input layer.
    pub interaction: InteractionConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            batching_enabled: true,
            dedup_enabled: true,
            stats_enabled: true,
            filtering_enabled: true,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_listeners_per_kind: DEFAULT_MAX_LISTENERS_PER_KIND,
            listener_timeout: DEFAULT_LISTENER_TIMEOUT,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            dedup_grid: DEFAULT_DEDUP_GRID,
            drain_budget: DEFAULT_DRAIN_BUDGET,
            frame_budget: FRAME_BUDGET,
            interaction: InteractionConfig::default(),
        }
    }
}

/// Gesture/click thresholds, carried as configuration for the input layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Maximum delay between clicks of a double-click.
    pub double_click_delay: Duration,
    /// Maximum pointer travel between clicks of a double-click.
    pub double_click_distance: f32,
    /// Hold duration before a press becomes a long-press.
    pub long_press_delay: Duration,
    /// Minimum scale change to report a pinch gesture step.
    pub gesture_scale_threshold: f32,
    /// Minimum rotation (radians) to report a rotate gesture step.
    pub gesture_rotate_threshold: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            double_click_delay: Duration::from_millis(300),
            double_click_distance: 5.0,
            long_press_delay: Duration::from_millis(500),
            gesture_scale_threshold: 0.05,
            gesture_rotate_threshold: 0.087,
        }
    }
}

/// Partial update applied by `EventBridge::configure`.
///
/// Only the feature toggles are runtime-switchable this way; `None` fields
/// leave the current value untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigUpdate {
    pub batching: Option<bool>,
    pub dedup: Option<bool>,
    pub stats: Option<bool>,
    pub filtering: Option<bool>,
}

impl ConfigUpdate {
    /// Apply this update to a configuration in place.
    pub fn apply(self, config: &mut BridgeConfig) {
        if let Some(batching) = self.batching {
            config.batching_enabled = batching;
        }
        if let Some(dedup) = self.dedup {
            config.dedup_enabled = dedup;
        }
        if let Some(stats) = self.stats {
            config.stats_enabled = stats;
        }
        if let Some(filtering) = self.filtering {
            config.filtering_enabled = filtering;
        }
    }
}

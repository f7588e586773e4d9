//! # Event Bridge Facade
//!
//! Composes the deduplicator, priority queues, and registries behind the
//! emit/dispatch surface the two producing subsystems consume.
//!
//! ## Pipeline
//!
//! ```text
//! emit(submission)
//!   │  disabled/disposed? ──────────────▶ drop
//!   │  duplicate movement? ─────────────▶ drop
//!   │  transformer chain (None cancels) ─▶ drop
//!   │  filter chain (any false vetoes) ──▶ drop
//!   ▼
//!   Immediate or batching off ──▶ dispatch now
//!   otherwise ──▶ enqueue (backpressure) ──▶ drained on frame ticks
//! ```
//!
//! Dispatch is awaited per event inside a drain pass, so delivery order
//! equals dequeue order: strict tier priority, FIFO within a tier. Listener
//! faults (errors, panics, timeouts) are isolated per listener and never
//! reach the emitter.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use bridge_types::{
    BridgeConfig, BridgeEvent, ConfigUpdate, EventKind, EventPayload, EventPriority, EventSource,
    EventSubmission, ListenerError,
};

use crate::dedup::Deduplicator;
use crate::queue::PriorityQueueManager;
use crate::registry::{
    EventListener, FilterFn, FilterId, FilterRegistry, ListenerFn, ListenerId, ListenerKey,
    ListenerOptions, ListenerRegistry, TransformerFn, TransformerId, TransformerRegistry,
};
use crate::stats::{BridgeStats, DropReason, StatsCollector};

/// The publishing seam consumed by the interaction and scene subsystems.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Publish one event; fire-and-forget, never fails.
    async fn emit(&self, submission: EventSubmission);

    /// Publish a batch in order; each event is deduped/transformed/filtered
    /// independently (no atomicity). Returns how many entered the pipeline.
    async fn emit_batch(&self, submissions: Vec<EventSubmission>) -> usize;

    /// Total events that completed a dispatch pass.
    fn events_processed(&self) -> u64;
}

/// Priority event bridge.
///
/// All registries, queues, and the dedup table are owned exclusively by one
/// instance. Mutation happens synchronously inside `emit`/dispatch/registry
/// calls; locks are never held across await points, so listeners may call
/// back into the bridge re-entrantly.
pub struct EventBridge {
    config: RwLock<BridgeConfig>,
    enabled: AtomicBool,
    disposed: AtomicBool,

    listeners: RwLock<ListenerRegistry>,
    filters: RwLock<FilterRegistry>,
    transformers: RwLock<TransformerRegistry>,
    queues: Mutex<PriorityQueueManager>,
    dedup: Mutex<Deduplicator>,

    stats: Mutex<StatsCollector>,
    events_emitted: AtomicU64,
    events_processed: AtomicU64,
    started: Instant,
}

impl EventBridge {
    /// Create a bridge with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Create a bridge with explicit configuration.
    #[must_use]
    pub fn with_config(config: BridgeConfig) -> Self {
        let queues = PriorityQueueManager::new(config.max_queue_size);
        let dedup = Deduplicator::new(config.dedup_window, config.dedup_grid);
        let listeners = ListenerRegistry::new(config.max_listeners_per_kind);
        Self {
            config: RwLock::new(config),
            enabled: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
            listeners: RwLock::new(listeners),
            filters: RwLock::new(FilterRegistry::new()),
            transformers: RwLock::new(TransformerRegistry::new()),
            queues: Mutex::new(queues),
            dedup: Mutex::new(dedup),
            stats: Mutex::new(StatsCollector::new()),
            events_emitted: AtomicU64::new(0),
            events_processed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    // -------------------------------------------------------------------
    // Configuration and lifecycle
    // -------------------------------------------------------------------

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> BridgeConfig {
        self.config.read().clone()
    }

    /// Toggle batching/dedup/stats/filtering. Takes effect for subsequent
    /// `emit` calls only; events already queued are unaffected.
    pub fn configure(&self, update: ConfigUpdate) {
        update.apply(&mut self.config.write());
    }

    /// Enable or disable emission. Disabling clears all pending queued
    /// events; dispatches already running are unaffected.
    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::SeqCst);
        if was && !enabled {
            let dropped = self.queues.lock().clear();
            if dropped > 0 {
                debug!(dropped, "bridge disabled, cleared pending queues");
            }
        }
    }

    /// Whether the bridge accepts emissions.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst) && !self.disposed.load(Ordering::SeqCst)
    }

    /// Empty listeners, filters, transformers, and queues.
    ///
    /// Deduplication bookkeeping survives so re-registered producers keep
    /// their suppression window.
    pub fn clear(&self) {
        self.listeners.write().clear();
        self.filters.write().clear();
        self.transformers.write().clear();
        self.queues.lock().clear();
    }

    /// Permanently disable emission and release queue/dedup resources.
    /// Idempotent; a disposed bridge degrades to silent no-ops.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.enabled.store(false, Ordering::SeqCst);
        self.clear();
        self.dedup.lock().clear();
        debug!("event bridge disposed");
    }

    /// Whether `dispose` has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------
    // Listener / filter / transformer management
    // -------------------------------------------------------------------

    /// Register a boxed listener. Returns `None` when the per-kind cap is
    /// reached (refused with a warning, not an error).
    pub fn add_listener(
        &self,
        key: ListenerKey,
        handler: ListenerFn,
        options: ListenerOptions,
    ) -> Option<ListenerId> {
        self.listeners.write().add(key, handler, options)
    }

    /// Register an async listener for one kind.
    pub fn on<F, Fut>(&self, kind: EventKind, handler: F) -> Option<ListenerId>
    where
        F: Fn(Arc<BridgeEvent>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        self.add_listener(
            ListenerKey::Kind(kind),
            Arc::new(move |event| handler(event).boxed()),
            ListenerOptions::default(),
        )
    }

    /// Register an async listener notified for every kind, after the
    /// kind-specific listeners.
    pub fn on_any<F, Fut>(&self, handler: F) -> Option<ListenerId>
    where
        F: Fn(Arc<BridgeEvent>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        self.add_listener(
            ListenerKey::Wildcard,
            Arc::new(move |event| handler(event).boxed()),
            ListenerOptions::default(),
        )
    }

    /// Register a synchronous, infallible listener for one kind.
    pub fn on_sync<F>(&self, kind: EventKind, handler: F) -> Option<ListenerId>
    where
        F: Fn(Arc<BridgeEvent>) + Send + Sync + 'static,
    {
        self.add_listener(
            ListenerKey::Kind(kind),
            Arc::new(move |event| {
                handler(event);
                futures::future::ready(Ok(())).boxed()
            }),
            ListenerOptions::default(),
        )
    }

    /// Register a listener that auto-unregisters after its first completed
    /// invocation, successful or not.
    pub fn once<F, Fut>(&self, kind: EventKind, handler: F) -> Option<ListenerId>
    where
        F: Fn(Arc<BridgeEvent>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        self.add_listener(
            ListenerKey::Kind(kind),
            Arc::new(move |event| handler(event).boxed()),
            ListenerOptions {
                once: true,
                ..ListenerOptions::default()
            },
        )
    }

    /// Remove a listener by handle. Unknown handles are a no-op.
    pub fn remove_listener(&self, key: ListenerKey, id: ListenerId) -> bool {
        self.listeners.write().remove(key, id)
    }

    /// Register a pre-dispatch filter for one kind. All filters must pass
    /// or the event is silently dropped.
    pub fn add_filter(&self, kind: EventKind, filter: FilterFn) -> FilterId {
        self.filters.write().add(kind, filter)
    }

    /// Remove a filter by handle.
    pub fn remove_filter(&self, kind: EventKind, id: FilterId) -> bool {
        self.filters.write().remove(kind, id)
    }

    /// Register a pre-dispatch transformer for one kind. Transformers chain
    /// in registration order; returning `None` cancels the event.
    pub fn add_transformer(&self, kind: EventKind, transformer: TransformerFn) -> TransformerId {
        self.transformers.write().add(kind, transformer)
    }

    /// Remove a transformer by handle.
    pub fn remove_transformer(&self, kind: EventKind, id: TransformerId) -> bool {
        self.transformers.write().remove(kind, id)
    }

    /// Listener count for one set.
    #[must_use]
    pub fn listener_count(&self, key: ListenerKey) -> usize {
        self.listeners.read().count(key)
    }

    // -------------------------------------------------------------------
    // Emission
    // -------------------------------------------------------------------

    /// Publish one event. Fire-and-forget: no error ever escapes to the
    /// emitting subsystem.
    pub async fn emit(&self, submission: EventSubmission) {
        self.emit_inner(submission).await;
    }

    /// Convenience for `emit` at `Normal` priority.
    pub async fn emit_normal(&self, kind: EventKind, payload: EventPayload, source: EventSource) {
        self.emit(EventSubmission::normal(kind, payload, source)).await;
    }

    /// Publish a batch in order. Returns how many events entered the
    /// pipeline (dispatched or enqueued); the rest were deduped, cancelled,
    /// vetoed, or dropped for capacity.
    pub async fn emit_batch(&self, submissions: Vec<EventSubmission>) -> usize {
        let mut accepted = 0;
        for submission in submissions {
            if self.emit_inner(submission).await {
                accepted += 1;
            }
        }
        accepted
    }

    /// Total events that completed a dispatch pass.
    #[must_use]
    pub fn events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
    }

    async fn emit_inner(&self, submission: EventSubmission) -> bool {
        if !self.is_enabled() {
            self.record_drop(DropReason::Disabled);
            return false;
        }
        self.events_emitted.fetch_add(1, Ordering::Relaxed);

        let config = self.config.read().clone();
        let mut event = submission.into_event();

        if config.dedup_enabled && self.dedup.lock().is_duplicate(&event) {
            trace!(kind = ?event.kind, id = %event.id, "duplicate movement event suppressed");
            self.record_drop(DropReason::Duplicate);
            return false;
        }

        let transformer_chain = self.transformers.read().chain(event.kind);
        for transformer in transformer_chain {
            match transformer(event) {
                Some(next) => event = next,
                None => {
                    trace!("event cancelled by transformer");
                    self.record_drop(DropReason::Transformed);
                    return false;
                }
            }
        }

        if config.filtering_enabled {
            let filter_chain = self.filters.read().chain(event.kind);
            if filter_chain.iter().any(|filter| !filter(&event)) {
                trace!(kind = ?event.kind, id = %event.id, "event vetoed by filter");
                self.record_drop(DropReason::Filtered);
                return false;
            }
        }

        let event = Arc::new(event);
        if config.batching_enabled && event.priority != EventPriority::Immediate {
            let accepted = {
                let mut queues = self.queues.lock();
                let accepted = queues.enqueue(event);
                if accepted {
                    queues.schedule_drain();
                }
                accepted
            };
            if !accepted {
                self.record_drop(DropReason::Capacity);
                return false;
            }
            // Urgent work already queued (by a direct queue user) is never
            // deferred to the next frame tick.
            self.drain_if_urgent().await;
            true
        } else {
            self.dispatch_event(event).await;
            true
        }
    }

    // -------------------------------------------------------------------
    // Draining and dispatch
    // -------------------------------------------------------------------

    /// Host-driven per-frame callback: runs one budgeted drain pass when one
    /// is scheduled, rescheduling itself while work remains.
    pub async fn on_frame(&self) {
        let budget = self.config.read().drain_budget;
        let wanted = {
            let queues = self.queues.lock();
            queues.drain_scheduled() || !queues.is_empty()
        };
        if wanted {
            self.drain(Some(budget)).await;
        }
    }

    /// Drain every tier to empty. Intended for host teardown and tests.
    pub async fn wait_idle(&self) {
        while !self.queues.lock().is_empty() {
            self.drain(None).await;
        }
    }

    async fn drain_if_urgent(&self) {
        let urgent = self.queues.lock().has_urgent();
        if urgent {
            self.drain(None).await;
        }
    }

    /// One drain pass: pop the head of the highest non-empty tier and
    /// dispatch it, until the tiers are empty or the budget expires. Only
    /// one drain may run at a time.
    async fn drain(&self, budget: Option<Duration>) {
        if !self.queues.lock().begin_drain() {
            return;
        }

        let start = Instant::now();
        loop {
            if let Some(budget) = budget {
                if start.elapsed() >= budget {
                    break;
                }
            }
            let next = self.queues.lock().pop_next();
            match next {
                Some(event) => self.dispatch_event(event).await,
                None => break,
            }
        }

        let mut queues = self.queues.lock();
        let remaining = !queues.is_empty();
        queues.end_drain(remaining);
        if remaining {
            debug!(
                queued = queues.total_len(),
                "drain budget exhausted, rescheduling"
            );
        }
    }

    /// Dispatch one event to its kind-specific then wildcard listeners.
    ///
    /// Stops early once propagation is stopped. Each invocation is raced
    /// against the listener timeout; faults are logged, counted against the
    /// kind, and never abort the rest of the pass.
    async fn dispatch_event(&self, event: Arc<BridgeEvent>) {
        let config = self.config.read().clone();
        let listeners = self.listeners.read().snapshot(event.kind);

        let start = Instant::now();
        let mut errors = 0u64;

        for (key, listener) in listeners {
            if event.propagation_stopped() {
                break;
            }
            let result =
                Self::invoke_listener(&listener, event.clone(), config.listener_timeout).await;
            if listener.once {
                // Removed before the next listener runs, so a re-entrant
                // emission never snapshots a spent once listener.
                self.listeners.write().remove(key, listener.id);
            }
            if let Err(error) = result {
                errors += 1;
                warn!(
                    kind = ?event.kind,
                    id = %event.id,
                    listener = %listener.id,
                    %error,
                    "listener fault isolated"
                );
            }
        }

        let elapsed = start.elapsed();
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        if config.stats_enabled {
            self.stats.lock().record_dispatch(event.kind, elapsed, errors);
        }
        if elapsed > config.frame_budget {
            warn!(
                kind = ?event.kind,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = config.frame_budget.as_millis() as u64,
                "dispatch exceeded frame budget"
            );
        }
    }

    /// Race one listener against the timeout, catching panics at the
    /// boundary. A listener that misses the deadline is cancelled: its
    /// future is dropped and the timeout counts as one fault.
    async fn invoke_listener(
        listener: &EventListener,
        event: Arc<BridgeEvent>,
        timeout: Duration,
    ) -> Result<(), ListenerError> {
        let invocation = AssertUnwindSafe((listener.handler)(event)).catch_unwind();
        match tokio::time::timeout(timeout, invocation).await {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(ListenerError::Panicked),
            Err(_elapsed) => Err(ListenerError::Timeout {
                elapsed_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    // -------------------------------------------------------------------
    // Statistics
    // -------------------------------------------------------------------

    /// Read-only snapshot of counters, per-kind statistics, queue depths,
    /// and listener counts.
    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        let queue_depths = self.queues.lock().depths();
        let listener_counts = self.listeners.read().counts();
        self.stats.lock().snapshot(
            self.events_emitted.load(Ordering::Relaxed),
            self.events_processed.load(Ordering::Relaxed),
            queue_depths,
            listener_counts,
            self.started.elapsed(),
        )
    }

    fn record_drop(&self, reason: DropReason) {
        if self.config.read().stats_enabled {
            self.stats.lock().record_drop(reason);
        }
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventEmitter for EventBridge {
    async fn emit(&self, submission: EventSubmission) {
        EventBridge::emit(self, submission).await;
    }

    async fn emit_batch(&self, submissions: Vec<EventSubmission>) -> usize {
        EventBridge::emit_batch(self, submissions).await
    }

    fn events_processed(&self) -> u64 {
        EventBridge::events_processed(self)
    }
}

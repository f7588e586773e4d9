//! # Listener / Filter / Transformer Registries
//!
//! Per-event-kind and wildcard listener sets, pre-dispatch filters (veto),
//! and pre-dispatch transformers (rewrite/cancel).
//!
//! Dispatch order follows registration order; kind-specific listeners run
//! before wildcard listeners. Registration past the per-kind cap is refused
//! with a warning, never an error; removing an unregistered entry is a no-op.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use bridge_types::{BridgeEvent, EventKind, ListenerError};
use futures::future::BoxFuture;

/// A listener invocation: async, fallible, fire-per-event.
pub type ListenerFuture = BoxFuture<'static, Result<(), ListenerError>>;

/// Boxed listener closure. Receives the shared event so it can read the
/// payload and set the propagation/default flags.
pub type ListenerFn = Arc<dyn Fn(Arc<BridgeEvent>) -> ListenerFuture + Send + Sync>;

/// Pre-dispatch predicate; `false` from any filter drops the event silently.
pub type FilterFn = Arc<dyn Fn(&BridgeEvent) -> bool + Send + Sync>;

/// Pre-dispatch rewrite; `None` cancels the event. Each transformer receives
/// the output of the previous one.
pub type TransformerFn = Arc<dyn Fn(BridgeEvent) -> Option<BridgeEvent> + Send + Sync>;

macro_rules! registration_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Uuid);

        impl $name {
            pub(crate) fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

registration_id! {
    /// Handle returned by listener registration, used for removal.
    ListenerId
}
registration_id! {
    /// Handle returned by filter registration, used for removal.
    FilterId
}
registration_id! {
    /// Handle returned by transformer registration, used for removal.
    TransformerId
}

/// Which listener set a registration targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKey {
    /// Listeners for one event kind.
    Kind(EventKind),
    /// Listeners notified for every kind, after kind-specific ones.
    Wildcard,
}

impl ListenerKey {
    /// Stable label for diagnostics and statistics.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Kind(kind) => format!("{kind:?}"),
            Self::Wildcard => "*".to_string(),
        }
    }
}

/// Optional metadata attached at registration.
///
/// `passive` and `priority_hint` are informational tags only: they are
/// readable through the registry but never affect dispatch order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// Auto-unregister after the first completed invocation.
    pub once: bool,
    /// Hint that the listener never calls `prevent_default`.
    pub passive: bool,
    /// Informational urgency tag.
    pub priority_hint: i32,
}

/// A registered listener and its metadata.
#[derive(Clone)]
pub struct EventListener {
    pub id: ListenerId,
    pub handler: ListenerFn,
    pub once: bool,
    pub passive: bool,
    pub priority_hint: i32,
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("id", &self.id)
            .field("once", &self.once)
            .field("passive", &self.passive)
            .field("priority_hint", &self.priority_hint)
            .finish_non_exhaustive()
    }
}

/// Per-kind and wildcard listener sets in registration order.
#[derive(Debug)]
pub struct ListenerRegistry {
    listeners: HashMap<ListenerKey, Vec<EventListener>>,
    max_per_kind: usize,
}

impl ListenerRegistry {
    /// Create a registry with the given per-kind cap.
    #[must_use]
    pub fn new(max_per_kind: usize) -> Self {
        Self {
            listeners: HashMap::new(),
            max_per_kind,
        }
    }

    /// Register a listener.
    ///
    /// Returns `None` (with a warning) when the target set is at its cap;
    /// the registration has no effect in that case.
    pub fn add(
        &mut self,
        key: ListenerKey,
        handler: ListenerFn,
        options: ListenerOptions,
    ) -> Option<ListenerId> {
        let set = self.listeners.entry(key).or_default();
        if set.len() >= self.max_per_kind {
            warn!(
                key = %key.label(),
                cap = self.max_per_kind,
                "listener cap reached, registration refused"
            );
            return None;
        }
        let id = ListenerId::generate();
        set.push(EventListener {
            id,
            handler,
            once: options.once,
            passive: options.passive,
            priority_hint: options.priority_hint,
        });
        Some(id)
    }

    /// Remove a listener by handle. Unknown handles are a no-op.
    pub fn remove(&mut self, key: ListenerKey, id: ListenerId) -> bool {
        let Some(set) = self.listeners.get_mut(&key) else {
            return false;
        };
        let before = set.len();
        set.retain(|listener| listener.id != id);
        before != set.len()
    }

    /// The dispatch snapshot for one kind: kind-specific listeners in
    /// registration order, then wildcard listeners.
    ///
    /// Snapshotting lets dispatch run without holding the registry lock, so
    /// listeners may register/unregister re-entrantly.
    #[must_use]
    pub fn snapshot(&self, kind: EventKind) -> Vec<(ListenerKey, EventListener)> {
        let mut out = Vec::new();
        for key in [ListenerKey::Kind(kind), ListenerKey::Wildcard] {
            if let Some(set) = self.listeners.get(&key) {
                out.extend(set.iter().cloned().map(|listener| (key, listener)));
            }
        }
        out
    }

    /// Listener count for one set.
    #[must_use]
    pub fn count(&self, key: ListenerKey) -> usize {
        self.listeners.get(&key).map_or(0, Vec::len)
    }

    /// Non-empty set sizes by label, for statistics.
    #[must_use]
    pub fn counts(&self) -> HashMap<String, usize> {
        self.listeners
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(key, set)| (key.label(), set.len()))
            .collect()
    }

    /// Change the per-kind cap; applies to subsequent registrations only.
    pub fn set_max_per_kind(&mut self, max_per_kind: usize) {
        self.max_per_kind = max_per_kind;
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

/// Per-kind pre-dispatch predicates. All must pass or the event is dropped.
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<EventKind, Vec<(FilterId, FilterFn)>>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter for one kind.
    pub fn add(&mut self, kind: EventKind, filter: FilterFn) -> FilterId {
        let id = FilterId::generate();
        self.filters.entry(kind).or_default().push((id, filter));
        id
    }

    /// Remove a filter by handle. Unknown handles are a no-op.
    pub fn remove(&mut self, kind: EventKind, id: FilterId) -> bool {
        let Some(set) = self.filters.get_mut(&kind) else {
            return false;
        };
        let before = set.len();
        set.retain(|(filter_id, _)| *filter_id != id);
        before != set.len()
    }

    /// Snapshot of the filter chain for one kind.
    #[must_use]
    pub fn chain(&self, kind: EventKind) -> Vec<FilterFn> {
        self.filters
            .get(&kind)
            .map(|set| set.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of filters registered for one kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.filters.get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }
}

/// Per-kind pre-dispatch rewrite chains, applied in registration order.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: HashMap<EventKind, Vec<(TransformerId, TransformerFn)>>,
}

impl TransformerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer for one kind.
    pub fn add(&mut self, kind: EventKind, transformer: TransformerFn) -> TransformerId {
        let id = TransformerId::generate();
        self.transformers
            .entry(kind)
            .or_default()
            .push((id, transformer));
        id
    }

    /// Remove a transformer by handle. Unknown handles are a no-op.
    pub fn remove(&mut self, kind: EventKind, id: TransformerId) -> bool {
        let Some(set) = self.transformers.get_mut(&kind) else {
            return false;
        };
        let before = set.len();
        set.retain(|(transformer_id, _)| *transformer_id != id);
        before != set.len()
    }

    /// Snapshot of the transformer chain for one kind.
    #[must_use]
    pub fn chain(&self, kind: EventKind) -> Vec<TransformerFn> {
        self.transformers
            .get(&kind)
            .map(|set| set.iter().map(|(_, t)| t.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of transformers registered for one kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.transformers.get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.transformers.clear();
    }
}

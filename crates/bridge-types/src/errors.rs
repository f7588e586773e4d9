//! Listener fault taxonomy.
//!
//! No error here ever reaches the emitting subsystem: faults are caught
//! during dispatch, logged, and counted in per-kind statistics. Capacity
//! refusals (queue full, listener cap) are signalled by boolean/`Option`
//! returns, not by errors.

use thiserror::Error;

/// A fault isolated to one listener invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// The listener did not complete within the configured timeout and was
    /// cancelled at the deadline.
    #[error("listener timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// The listener reported a failure.
    #[error("listener failed: {0}")]
    Failed(String),

    /// The listener panicked; the panic was caught at the dispatch boundary.
    #[error("listener panicked")]
    Panicked,
}
